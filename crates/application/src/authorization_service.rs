use std::sync::Arc;

use enermina_core::{AppError, AppResult};
use enermina_domain::policy::PolicyOperation;
use enermina_domain::{
    Decision, DenyReason, EntitySchema, EntityType, GatewayMutation, ListingScope, Operation,
    OwnerCheck, Record, SchemaCatalog, Subject, evaluate_gateway_access,
};

/// Application service evaluating entity and gateway access policies.
#[derive(Clone)]
pub struct AuthorizationService {
    catalog: Arc<SchemaCatalog>,
}

impl AuthorizationService {
    /// Creates an authorization service over a schema catalog.
    #[must_use]
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self { catalog }
    }

    /// Returns the schema catalog the policies are read from.
    #[must_use]
    pub fn catalog(&self) -> &SchemaCatalog {
        self.catalog.as_ref()
    }

    /// Returns the schema of an entity type.
    pub fn schema(&self, entity_type: EntityType) -> AppResult<&EntitySchema> {
        self.catalog.schema(entity_type)
    }

    /// Evaluates an entity operation without failing on denial.
    pub fn evaluate(
        &self,
        subject: &Subject,
        entity_type: EntityType,
        operation: Operation,
        owner: OwnerCheck<'_>,
    ) -> AppResult<Decision> {
        let schema = self.catalog.schema(entity_type)?;
        Ok(schema.policy().evaluate(subject, operation, owner))
    }

    /// Fails with `OperationDisabled` when the entity disables the operation.
    ///
    /// Lets callers reject disabled operations before loading the target.
    pub fn ensure_enabled(&self, entity_type: EntityType, operation: Operation) -> AppResult<()> {
        if self.catalog.schema(entity_type)?.policy().is_disabled(operation) {
            return Err(AppError::OperationDisabled(format!(
                "{} on '{}'",
                operation.label(),
                entity_type.as_str()
            )));
        }

        Ok(())
    }

    /// Requires an entity operation to be allowed.
    pub fn require(
        &self,
        subject: &Subject,
        entity_type: EntityType,
        operation: Operation,
        owner: OwnerCheck<'_>,
    ) -> AppResult<()> {
        let decision = self.evaluate(subject, entity_type, operation, owner)?;
        require_allowed(decision, subject, operation, entity_type.as_str())
    }

    /// Requires an operation on a stored record, checking its stored owner.
    pub fn require_on_record(
        &self,
        subject: &Subject,
        operation: Operation,
        record: &Record,
    ) -> AppResult<()> {
        let schema = self.catalog.schema(record.entity_type())?;
        let decision = schema
            .policy()
            .evaluate(subject, operation, schema.instance_owner(record));
        require_allowed(decision, subject, operation, record.entity_type().as_str())
    }

    /// Returns true when the subject may read the stored record.
    #[must_use]
    pub fn can_read(&self, subject: &Subject, record: &Record) -> bool {
        self.require_on_record(subject, Operation::Read, record)
            .is_ok()
    }

    /// Resolves which records of a type a listing or subscription may return.
    pub fn listing_scope(
        &self,
        subject: &Subject,
        entity_type: EntityType,
        operation: Operation,
    ) -> AppResult<ListingScope> {
        let schema = self.catalog.schema(entity_type)?;
        match schema.policy().listing_scope(subject, operation) {
            ListingScope::Denied(reason) => Err(denial(
                reason,
                subject,
                operation.label(),
                entity_type.as_str(),
            )),
            scope => Ok(scope),
        }
    }

    /// Requires a gateway mutation to be allowed.
    pub fn require_gateway(&self, subject: &Subject, mutation: GatewayMutation) -> AppResult<()> {
        require_allowed(
            evaluate_gateway_access(subject, mutation),
            subject,
            mutation,
            "gateway",
        )
    }
}

/// Converts a policy decision into a result.
pub(crate) fn require_allowed<Op: PolicyOperation>(
    decision: Decision,
    subject: &Subject,
    operation: Op,
    target: &str,
) -> AppResult<()> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(denial(reason, subject, operation.label(), target)),
    }
}

fn denial(reason: DenyReason, subject: &Subject, operation: &str, target: &str) -> AppError {
    match reason {
        DenyReason::OperationDisabled => {
            AppError::OperationDisabled(format!("{operation} on '{target}'"))
        }
        DenyReason::NotAuthorized => AppError::NotAuthorized(format!(
            "subject '{}' may not {operation} '{target}'",
            subject.label()
        )),
    }
}

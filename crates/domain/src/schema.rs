//! Entity schemas: typed fields, identifiers, ownership, relationships,
//! access policy, local invariants and store-enforced indexes.

mod catalog;
mod field;
mod invariant;

use enermina_core::{AppError, AppResult};
use serde_json::{Map, Value};

use crate::policy::{Operation, OwnerCheck, Policy, SubjectMatcher};
use crate::record::{Record, RecordKey, index_value};
use crate::relationship::{Relationship, TagFilter, dispatch};
use crate::EntityType;

pub use catalog::SchemaCatalog;
pub use field::{FieldKind, FieldSpec, validate_object};
pub use invariant::Invariant;

/// Field stamped with the creator's identity when an entity declares no
/// explicit owner field.
pub const IMPLICIT_OWNER_FIELD: &str = "owner";

/// Soft-delete marker field.
pub const SOFT_DELETE_FIELD: &str = "isDeleted";

/// Where a record's owner identity is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerField {
    /// A declared field holds the owner's identity.
    Explicit(&'static str),
    /// The platform stamps [`IMPLICIT_OWNER_FIELD`] at creation.
    Implicit,
    /// The entity has no owner.
    None,
}

impl OwnerField {
    /// Returns the field holding the owner identity.
    #[must_use]
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            Self::Explicit(field) => Some(*field),
            Self::Implicit => Some(IMPLICIT_OWNER_FIELD),
            Self::None => None,
        }
    }
}

/// Secondary index the record store maintains for an entity.
///
/// Unique indexes are enforced at commit, which is what makes conditional
/// inserts and at-most-one-per-key rules race free.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    entity_type: EntityType,
    fields: Vec<&'static str>,
    unique: bool,
    only_when: Option<(&'static str, Value)>,
}

impl IndexSpec {
    /// Non-unique lookup index over one field.
    #[must_use]
    pub fn lookup(entity_type: EntityType, field: &'static str) -> Self {
        Self {
            entity_type,
            fields: vec![field],
            unique: false,
            only_when: None,
        }
    }

    /// Returns the indexed entity type.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Returns the indexed fields.
    #[must_use]
    pub fn fields(&self) -> &[&'static str] {
        self.fields.as_slice()
    }

    /// Returns true when at most one record may hold each index value.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns the partial-index condition, if any.
    #[must_use]
    pub fn only_when(&self) -> Option<(&'static str, &Value)> {
        self.only_when.as_ref().map(|(field, value)| (*field, value))
    }

    /// Returns a stable name for diagnostics and physical index names.
    #[must_use]
    pub fn name(&self) -> String {
        let kind = if self.unique { "uq" } else { "ix" };
        format!("{kind}_{}_{}", self.entity_type.as_str(), self.fields.join("_"))
    }

    /// Computes the index entry of a record payload.
    ///
    /// Returns `None` when the record is not covered: a field is missing or
    /// null, or the partial condition does not hold.
    #[must_use]
    pub fn entry(&self, data: &Map<String, Value>) -> Option<Vec<String>> {
        if let Some((field, expected)) = &self.only_when
            && data.get(*field) != Some(expected)
        {
            return None;
        }

        self.fields
            .iter()
            .map(|field| data.get(*field).and_then(index_value))
            .collect()
    }
}

/// Soft-deletable parent a listed record hides behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingParent {
    /// Foreign key field on the child.
    pub field: &'static str,
    /// Parent type.
    pub target: EntityType,
}

/// Complete declaration of one entity type.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    entity_type: EntityType,
    identifier: Vec<&'static str>,
    fields: Vec<FieldSpec>,
    owner: OwnerField,
    policy: Policy<Operation>,
    relationships: Vec<Relationship>,
    invariants: Vec<Invariant>,
    indexes: Vec<IndexSpec>,
    soft_delete: bool,
    listing_parents: Vec<ListingParent>,
}

impl EntitySchema {
    /// Starts a schema declaration.
    #[must_use]
    pub fn builder(entity_type: EntityType) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            schema: Self {
                entity_type,
                identifier: vec!["id"],
                fields: Vec::new(),
                owner: OwnerField::None,
                policy: Policy::default(),
                relationships: Vec::new(),
                invariants: Vec::new(),
                indexes: Vec::new(),
                soft_delete: false,
                listing_parents: Vec::new(),
            },
        }
    }

    /// Returns the entity type.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Returns the identifier fields.
    #[must_use]
    pub fn identifier(&self) -> &[&'static str] {
        self.identifier.as_slice()
    }

    /// Returns the declared fields.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        self.fields.as_slice()
    }

    /// Returns a declared field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Returns the owner declaration.
    #[must_use]
    pub fn owner(&self) -> OwnerField {
        self.owner
    }

    /// Returns the access policy.
    #[must_use]
    pub fn policy(&self) -> &Policy<Operation> {
        &self.policy
    }

    /// Returns the declared relationships.
    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        self.relationships.as_slice()
    }

    /// Returns a relationship by name.
    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships
            .iter()
            .find(|relationship| relationship.name() == name)
    }

    /// Returns the store indexes declared by this entity.
    #[must_use]
    pub fn indexes(&self) -> &[IndexSpec] {
        self.indexes.as_slice()
    }

    /// Returns true when deletes mark [`SOFT_DELETE_FIELD`] instead of removing.
    #[must_use]
    pub fn is_soft_deletable(&self) -> bool {
        self.soft_delete
    }

    /// Returns the parents whose soft deletion hides this record from listings.
    #[must_use]
    pub fn listing_parents(&self) -> &[ListingParent] {
        self.listing_parents.as_slice()
    }

    /// Returns the owner identity stored on a payload.
    #[must_use]
    pub fn owner_of<'a>(&self, data: &'a Map<String, Value>) -> Option<&'a str> {
        self.owner
            .field_name()
            .and_then(|field| data.get(field))
            .and_then(Value::as_str)
    }

    /// Returns ownership facts for a stored record.
    #[must_use]
    pub fn instance_owner<'a>(&self, record: &'a Record) -> OwnerCheck<'a> {
        match self.owner {
            OwnerField::None => OwnerCheck::NotApplicable,
            _ => OwnerCheck::Instance(self.owner_of(record.data())),
        }
    }

    /// Returns ownership facts for a payload about to be created.
    #[must_use]
    pub fn proposed_owner<'a>(&self, data: &'a Map<String, Value>) -> OwnerCheck<'a> {
        match self.owner {
            OwnerField::None => OwnerCheck::NotApplicable,
            _ => OwnerCheck::Proposed(self.owner_of(data)),
        }
    }

    /// Builds the record key from the identifier fields of a payload.
    pub fn key_of(&self, data: &Map<String, Value>) -> AppResult<RecordKey> {
        let parts = self
            .identifier
            .iter()
            .map(|field| {
                data.get(*field)
                    .and_then(index_value)
                    .ok_or_else(|| {
                        AppError::Validation(format!(
                            "identifier field '{field}' of '{}' is required",
                            self.entity_type.as_str()
                        ))
                    })
            })
            .collect::<AppResult<Vec<_>>>()?;

        RecordKey::from_parts(parts)
    }

    /// Checks that a key has one part per identifier field.
    pub fn validate_key(&self, key: &RecordKey) -> AppResult<()> {
        if key.parts().len() != self.identifier.len() {
            return Err(AppError::Validation(format!(
                "'{}' is identified by ({}), got key '{key}'",
                self.entity_type.as_str(),
                self.identifier.join(", ")
            )));
        }

        Ok(())
    }

    /// Normalizes a create payload: rejects unknown fields, applies defaults,
    /// checks types, tags and local invariants.
    pub fn normalize_create(&self, payload: Map<String, Value>) -> AppResult<Map<String, Value>> {
        self.reject_unknown(&payload)?;
        self.check_polymorphic_tags(&payload)?;

        let mut data = payload;
        for field in &self.fields {
            if let Some(default) = field.default() {
                match data.get(field.name()) {
                    None | Some(Value::Null) => {
                        data.insert(field.name().to_owned(), default.clone());
                    }
                    Some(value) if field.is_managed() && value != default => {
                        return Err(AppError::Validation(format!(
                            "field '{}' starts as {default} and is changed only by lifecycle operations",
                            field.name()
                        )));
                    }
                    Some(_) => {}
                }
            }
        }

        validate_object(&self.fields, &data)?;
        self.check_invariants(&data)?;
        Ok(data)
    }

    /// Merges an update patch into the stored payload and validates the result.
    ///
    /// Identifier, immutable, owner and lifecycle-managed fields cannot change.
    pub fn normalize_update(
        &self,
        existing: &Map<String, Value>,
        patch: Map<String, Value>,
    ) -> AppResult<Map<String, Value>> {
        self.reject_unknown(&patch)?;
        self.check_polymorphic_tags(&patch)?;

        let owner_field = self.owner.field_name();
        for (name, value) in &patch {
            if existing.get(name) == Some(value) {
                continue;
            }

            let is_identifier = self.identifier.iter().any(|field| *field == name.as_str());
            let is_owner = owner_field == Some(name.as_str());
            let field = self.field(name);
            if is_identifier || is_owner || field.is_some_and(FieldSpec::is_immutable) {
                return Err(AppError::Validation(format!(
                    "field '{name}' cannot change after creation"
                )));
            }
            if field.is_some_and(FieldSpec::is_managed) {
                return Err(AppError::Validation(format!(
                    "field '{name}' is changed only by lifecycle operations"
                )));
            }
        }

        let mut merged = existing.clone();
        merged.extend(patch);
        validate_object(&self.fields, &merged)?;
        self.check_invariants(&merged)?;
        Ok(merged)
    }

    /// Checks every local invariant.
    pub fn check_invariants(&self, data: &Map<String, Value>) -> AppResult<()> {
        for invariant in &self.invariants {
            invariant.check(data)?;
        }

        Ok(())
    }

    fn reject_unknown(&self, payload: &Map<String, Value>) -> AppResult<()> {
        if let Some(unknown) = payload.keys().find(|key| self.field(key).is_none()) {
            return Err(AppError::Validation(format!(
                "unknown field '{unknown}' for '{}'",
                self.entity_type.as_str()
            )));
        }

        Ok(())
    }

    fn check_polymorphic_tags(&self, payload: &Map<String, Value>) -> AppResult<()> {
        for relationship in &self.relationships {
            if let Relationship::Polymorphic {
                tag_field, targets, ..
            } = relationship
                && let Some(tag) = payload.get(*tag_field).filter(|value| !value.is_null())
            {
                let known = tag
                    .as_str()
                    .is_some_and(|tag| dispatch(targets, tag).is_some());
                if !known {
                    return Err(AppError::SchemaViolation(format!(
                        "{tag} is not a declared '{tag_field}' of '{}'",
                        self.entity_type.as_str()
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Fluent declaration of an [`EntitySchema`].
#[derive(Debug)]
pub struct EntitySchemaBuilder {
    schema: EntitySchema,
}

impl EntitySchemaBuilder {
    /// Replaces the default `id` identifier.
    #[must_use]
    pub fn identified_by(mut self, fields: &[&'static str]) -> Self {
        self.schema.identifier = fields.to_vec();
        self
    }

    /// Declares a field.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.schema.fields.push(field);
        self
    }

    /// Declares an explicit owner field.
    #[must_use]
    pub fn owned_by(mut self, field: &'static str) -> Self {
        self.schema.owner = OwnerField::Explicit(field);
        self
    }

    /// Declares the implicit, creation-stamped owner field.
    #[must_use]
    pub fn implicit_owner(mut self) -> Self {
        self.schema.owner = OwnerField::Implicit;
        self.schema
            .fields
            .push(FieldSpec::text(IMPLICIT_OWNER_FIELD).immutable());
        self
    }

    /// Adds an access rule.
    #[must_use]
    pub fn allow(mut self, matcher: SubjectMatcher, operations: &[Operation]) -> Self {
        self.schema.policy = self.schema.policy.allow(matcher, operations);
        self
    }

    /// Disables operations for every subject.
    #[must_use]
    pub fn disable(mut self, operations: &[Operation]) -> Self {
        self.schema.policy = self.schema.policy.disable(operations);
        self
    }

    /// Declares a `belongsTo` relationship.
    #[must_use]
    pub fn belongs_to(mut self, name: &'static str, field: &'static str, target: EntityType) -> Self {
        self.schema.relationships.push(Relationship::BelongsTo {
            name,
            field,
            target,
        });
        self
    }

    /// Declares a `hasMany` relationship.
    #[must_use]
    pub fn has_many(
        mut self,
        name: &'static str,
        target: EntityType,
        foreign_key: &'static str,
    ) -> Self {
        self.schema.relationships.push(Relationship::HasMany {
            name,
            target,
            foreign_key,
            tag: None,
        });
        self
    }

    /// Declares a `hasMany` through a polymorphic foreign key.
    #[must_use]
    pub fn has_many_tagged(
        mut self,
        name: &'static str,
        target: EntityType,
        foreign_key: &'static str,
        tag: (&'static str, &'static str),
    ) -> Self {
        self.schema.relationships.push(Relationship::HasMany {
            name,
            target,
            foreign_key,
            tag: Some(TagFilter {
                field: tag.0,
                value: tag.1,
            }),
        });
        self
    }

    /// Declares a `hasOne` relationship.
    #[must_use]
    pub fn has_one(mut self, name: &'static str, target: EntityType, foreign_key: &'static str) -> Self {
        self.schema.relationships.push(Relationship::HasOne {
            name,
            target,
            foreign_key,
            tag: None,
        });
        self
    }

    /// Declares a `hasOne` through a polymorphic foreign key.
    #[must_use]
    pub fn has_one_tagged(
        mut self,
        name: &'static str,
        target: EntityType,
        foreign_key: &'static str,
        tag: (&'static str, &'static str),
    ) -> Self {
        self.schema.relationships.push(Relationship::HasOne {
            name,
            target,
            foreign_key,
            tag: Some(TagFilter {
                field: tag.0,
                value: tag.1,
            }),
        });
        self
    }

    /// Declares a polymorphic `(tag, id)` reference.
    #[must_use]
    pub fn polymorphic(
        mut self,
        name: &'static str,
        tag_field: &'static str,
        id_field: &'static str,
        targets: &'static [(&'static str, EntityType)],
    ) -> Self {
        self.schema.relationships.push(Relationship::Polymorphic {
            name,
            tag_field,
            id_field,
            targets,
        });
        self
    }

    /// Declares a local invariant.
    #[must_use]
    pub fn invariant(mut self, invariant: Invariant) -> Self {
        self.schema.invariants.push(invariant);
        self
    }

    /// Declares a unique index over the fields.
    #[must_use]
    pub fn unique(mut self, fields: &[&'static str]) -> Self {
        self.schema.indexes.push(IndexSpec {
            entity_type: self.schema.entity_type,
            fields: fields.to_vec(),
            unique: true,
            only_when: None,
        });
        self
    }

    /// Declares a unique index covering only records where `flag == value`.
    #[must_use]
    pub fn unique_when(mut self, fields: &[&'static str], flag: &'static str, value: Value) -> Self {
        self.schema.indexes.push(IndexSpec {
            entity_type: self.schema.entity_type,
            fields: fields.to_vec(),
            unique: true,
            only_when: Some((flag, value)),
        });
        self
    }

    /// Enables soft deletion through [`SOFT_DELETE_FIELD`].
    #[must_use]
    pub fn soft_delete(mut self) -> Self {
        self.schema.soft_delete = true;
        self
    }

    /// Hides the record from listings while the referenced parent is soft-deleted.
    #[must_use]
    pub fn listed_under(mut self, field: &'static str, target: EntityType) -> Self {
        self.schema.listing_parents.push(ListingParent { field, target });
        self
    }

    /// Finishes the declaration.
    #[must_use]
    pub fn build(self) -> EntitySchema {
        self.schema
    }
}

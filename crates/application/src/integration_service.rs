use std::str::FromStr;
use std::sync::Arc;

use enermina_core::{AppError, AppResult, NonEmptyString};
use enermina_domain::{
    EmailAddress, EntityType, GatewayMutation, Operation, OwnerCheck, Record, RecordKey,
    SchemaCatalog, Subject, UserRole, validate_password,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::AuthorizationService;
use crate::integration_ports::{EmailService, IdentityProvider, SearchIndex, StreamTokenIssuer};
use crate::record_ports::{RecordStore, RecordWrite, WriteBatch};

/// Result payload of every gateway mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationReceipt {
    /// Human-readable outcome, or the issued token.
    pub content: String,
}

impl MutationReceipt {
    fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Contact form relayed to the support mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportContactInput {
    /// Sender name.
    pub name: String,
    /// Sender address, used as reply-to.
    pub email: String,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Contact reason picked in the form.
    pub reason: String,
    /// Optional subject line.
    pub subject: Option<String>,
    /// Message body.
    pub message: String,
}

/// Sign-up confirmation reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostConfirmationInput {
    /// Identity subject of the confirmed account.
    pub auth_id: String,
    /// Confirmed email address.
    pub email: String,
    /// Display name, when the sign-up form collected one.
    pub name: Option<String>,
}

/// Application service behind the gateway mutations and the
/// post-registration trigger.
#[derive(Clone)]
pub struct IntegrationService {
    authorization_service: AuthorizationService,
    store: Arc<dyn RecordStore>,
    identity_provider: Arc<dyn IdentityProvider>,
    search_index: Arc<dyn SearchIndex>,
    stream_tokens: Arc<dyn StreamTokenIssuer>,
    email_service: Arc<dyn EmailService>,
    support_address: EmailAddress,
}

impl IntegrationService {
    /// Creates a new integration service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        store: Arc<dyn RecordStore>,
        identity_provider: Arc<dyn IdentityProvider>,
        search_index: Arc<dyn SearchIndex>,
        stream_tokens: Arc<dyn StreamTokenIssuer>,
        email_service: Arc<dyn EmailService>,
        support_address: EmailAddress,
    ) -> Self {
        Self {
            authorization_service,
            store,
            identity_provider,
            search_index,
            stream_tokens,
            email_service,
            support_address,
        }
    }

    /// Adds an identity to a role group.
    ///
    /// The stored user's `role` follows the group when the user record
    /// exists.
    pub async fn add_user_to_group(
        &self,
        subject: &Subject,
        auth_id: &str,
        group_name: &str,
    ) -> AppResult<MutationReceipt> {
        self.authorization_service
            .require_gateway(subject, GatewayMutation::AddUserToGroup)?;
        let auth_id = NonEmptyString::new(auth_id)?;
        let group = UserRole::from_str(group_name)?;

        self.identity_provider
            .add_user_to_group(auth_id.as_str(), group)
            .await?;

        let key = RecordKey::single(auth_id.as_str());
        if let Some(user) = self.store.find(EntityType::User, &key).await?
            && user.text("role") != Some(group.as_str())
        {
            let mut data = user.data().clone();
            data.insert("role".to_owned(), Value::String(group.as_str().to_owned()));
            let mut batch = WriteBatch::new();
            batch.push(RecordWrite::replace(&user, data));
            self.store.commit(batch).await?;
        }

        Ok(MutationReceipt::new(format!(
            "user {} added to group {}",
            auth_id.as_str(),
            group.as_str()
        )))
    }

    /// Provisions an identity with a permanent password.
    pub async fn admin_create_user(
        &self,
        subject: &Subject,
        email: &str,
        password: &str,
    ) -> AppResult<MutationReceipt> {
        self.authorization_service
            .require_gateway(subject, GatewayMutation::AdminCreateUser)?;
        let email = EmailAddress::new(email)?;
        validate_password(password)?;

        let identity = self
            .identity_provider
            .admin_create_user(&email, password)
            .await?;
        Ok(MutationReceipt::new(identity))
    }

    /// Creates or replaces a search document.
    pub async fn add_or_update_searchable_record(
        &self,
        subject: &Subject,
        index_name: &str,
        object_id: &str,
        body: Value,
    ) -> AppResult<MutationReceipt> {
        self.authorization_service
            .require_gateway(subject, GatewayMutation::AddOrUpdateSearchableRecord)?;
        let index_name = NonEmptyString::new(index_name)?;
        let object_id = NonEmptyString::new(object_id)?;
        let Value::Object(body) = body else {
            return Err(AppError::Validation(
                "search document body must be a JSON object".to_owned(),
            ));
        };

        self.search_index
            .upsert(index_name.as_str(), object_id.as_str(), body)
            .await?;
        Ok(MutationReceipt::new(format!(
            "{} indexed in {}",
            object_id.as_str(),
            index_name.as_str()
        )))
    }

    /// Removes a search document.
    pub async fn delete_searchable_record(
        &self,
        subject: &Subject,
        index_name: &str,
        object_id: &str,
    ) -> AppResult<MutationReceipt> {
        self.authorization_service
            .require_gateway(subject, GatewayMutation::DeleteSearchableRecord)?;
        let index_name = NonEmptyString::new(index_name)?;
        let object_id = NonEmptyString::new(object_id)?;

        self.search_index
            .delete(index_name.as_str(), object_id.as_str())
            .await?;
        Ok(MutationReceipt::new(format!(
            "{} removed from {}",
            object_id.as_str(),
            index_name.as_str()
        )))
    }

    /// Issues a realtime messaging token; the receipt content is the token.
    pub async fn create_stream_token(
        &self,
        subject: &Subject,
        user_id: &str,
    ) -> AppResult<MutationReceipt> {
        self.authorization_service
            .require_gateway(subject, GatewayMutation::CreateStreamToken)?;
        let user_id = NonEmptyString::new(user_id)?;

        let token = self.stream_tokens.issue(user_id.as_str()).await?;
        Ok(MutationReceipt::new(token))
    }

    /// Relays a contact form to the support mailbox with reply-to set to the
    /// sender.
    pub async fn support_contact_email(
        &self,
        subject: &Subject,
        input: SupportContactInput,
    ) -> AppResult<MutationReceipt> {
        self.authorization_service
            .require_gateway(subject, GatewayMutation::SupportContactEmail)?;
        let name = NonEmptyString::new(input.name)?;
        let sender = EmailAddress::new(input.email)?;
        let reason = NonEmptyString::new(input.reason)?;
        let message = NonEmptyString::new(input.message)?;

        let email_subject = match input.subject.as_deref().map(str::trim) {
            Some(subject) if !subject.is_empty() => {
                format!("[{}] {subject}", reason.as_str())
            }
            _ => format!("[{}] Contact from {}", reason.as_str(), name.as_str()),
        };
        let phone = input
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .unwrap_or("not provided");
        let text_body = format!(
            "Name: {}\nEmail: {}\nPhone: {phone}\nReason: {}\n\n{}",
            name.as_str(),
            sender.as_str(),
            reason.as_str(),
            message.as_str()
        );

        self.email_service
            .send_email(
                self.support_address.as_str(),
                Some(sender.as_str()),
                &email_subject,
                &text_body,
                None,
            )
            .await?;
        Ok(MutationReceipt::new("support request sent"))
    }

    /// Creates the user record of a newly confirmed identity.
    ///
    /// Runs as the system subject. The user starts as SUBSCRIBER and the
    /// identity joins the SUBSCRIBER group. Repeated confirmations return the
    /// existing record unchanged.
    pub async fn handle_post_confirmation(&self, input: PostConfirmationInput) -> AppResult<Record> {
        let subject = Subject::System;
        let auth_id = NonEmptyString::new(input.auth_id)?;
        let email = EmailAddress::new(input.email)?;
        let key = RecordKey::single(auth_id.as_str());

        if let Some(existing) = self.store.find(EntityType::User, &key).await? {
            return Ok(existing);
        }

        let mut payload = Map::new();
        payload.insert("authId".to_owned(), json!(auth_id.as_str()));
        payload.insert("email".to_owned(), json!(email.as_str()));
        payload.insert("role".to_owned(), json!(UserRole::Subscriber.as_str()));
        payload.insert("pushTokens".to_owned(), json!([]));
        if let Some(name) = input.name.filter(|name| !name.trim().is_empty()) {
            payload.insert("name".to_owned(), json!(name));
        }

        let schema = self.catalog().schema(EntityType::User)?;
        self.authorization_service.require(
            &subject,
            EntityType::User,
            Operation::Create,
            OwnerCheck::Proposed(Some(auth_id.as_str())),
        )?;
        let data = schema.normalize_create(payload)?;

        self.identity_provider
            .add_user_to_group(auth_id.as_str(), UserRole::Subscriber)
            .await?;

        let mut batch = WriteBatch::new();
        batch.push(RecordWrite::Insert {
            entity_type: EntityType::User,
            key: key.clone(),
            data,
        });
        match self.store.commit(batch).await {
            Ok(mut written) => written.pop().ok_or_else(|| {
                AppError::Internal("record store returned no written record".to_owned())
            }),
            Err(AppError::AlreadyExists(_)) => {
                self.store.find(EntityType::User, &key).await?.ok_or_else(|| {
                    AppError::Internal(format!(
                        "user '{key}' conflicted on insert but cannot be read"
                    ))
                })
            }
            Err(error) => Err(error),
        }
    }

    fn catalog(&self) -> &SchemaCatalog {
        self.authorization_service.catalog()
    }
}

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use enermina_core::AppResult;
use enermina_domain::{EmailAddress, UserRole};
use serde_json::{Map, Value};

/// Port for the external identity provider's admin API.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Adds an identity to a provider group.
    async fn add_user_to_group(&self, auth_id: &str, group: UserRole) -> AppResult<()>;

    /// Provisions an identity with a permanent password and returns its
    /// subject identifier.
    async fn admin_create_user(&self, email: &EmailAddress, password: &str) -> AppResult<String>;
}

/// Port for the external full-text search index.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Creates or replaces a document.
    async fn upsert(
        &self,
        index_name: &str,
        object_id: &str,
        body: Map<String, Value>,
    ) -> AppResult<()>;

    /// Removes a document. Removing an absent document succeeds.
    async fn delete(&self, index_name: &str, object_id: &str) -> AppResult<()>;
}

/// Port issuing realtime messaging tokens.
#[async_trait]
pub trait StreamTokenIssuer: Send + Sync {
    /// Issues a token for the given user.
    async fn issue(&self, user_id: &str) -> AppResult<String>;
}

/// Port for sending emails. Infrastructure provides SMTP or console implementations.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends a plain-text or HTML email, optionally with a reply-to address.
    async fn send_email(
        &self,
        to: &str,
        reply_to: Option<&str>,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()>;
}

//! In-process identity directory for development and tests.
//!
//! Passwords are stored as Argon2id hashes with OWASP-recommended
//! parameters: m=19456 (19 MiB), t=2, p=1.

use std::collections::{BTreeSet, HashMap};

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use async_trait::async_trait;
use enermina_application::IdentityProvider;
use enermina_core::{AppError, AppResult};
use enermina_domain::{EmailAddress, UserRole};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    subject: String,
    password_hash: String,
}

/// Identity directory keeping accounts and group memberships in memory.
pub struct InMemoryIdentityDirectory {
    argon2: Argon2<'static>,
    accounts: RwLock<HashMap<String, Account>>,
    memberships: RwLock<HashMap<String, BTreeSet<UserRole>>>,
}

impl InMemoryIdentityDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(19456, 2, 1, None).unwrap_or_else(|_| Params::default());

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            accounts: RwLock::new(HashMap::new()),
            memberships: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the groups an identity belongs to.
    pub async fn groups_of(&self, auth_id: &str) -> BTreeSet<UserRole> {
        self.memberships
            .read()
            .await
            .get(auth_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Checks a password and returns the identity subject on success.
    pub async fn authenticate(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> AppResult<Option<String>> {
        let Some(account) = self.accounts.read().await.get(email.as_str()).cloned() else {
            return Ok(None);
        };

        let parsed_hash = PasswordHash::new(&account.password_hash).map_err(|error| {
            AppError::Internal(format!("failed to parse password hash: {error}"))
        })?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(Some(account.subject)),
            Err(argon2::password_hash::Error::Password) => Ok(None),
            Err(error) => Err(AppError::Internal(format!(
                "password verification failed: {error}"
            ))),
        }
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|error| AppError::Internal(format!("failed to hash password: {error}")))?;

        Ok(hash.to_string())
    }
}

impl Default for InMemoryIdentityDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityDirectory {
    async fn add_user_to_group(&self, auth_id: &str, group: UserRole) -> AppResult<()> {
        let added = self
            .memberships
            .write()
            .await
            .entry(auth_id.to_owned())
            .or_default()
            .insert(group);

        if added {
            info!(auth_id, group = group.as_str(), "identity added to group");
        }
        Ok(())
    }

    async fn admin_create_user(&self, email: &EmailAddress, password: &str) -> AppResult<String> {
        let password_hash = self.hash_password(password)?;
        let mut accounts = self.accounts.write().await;

        if accounts.contains_key(email.as_str()) {
            return Err(AppError::AlreadyExists(format!(
                "an identity with email '{}' already exists",
                email.as_str()
            )));
        }

        let subject = Uuid::new_v4().to_string();
        accounts.insert(
            email.as_str().to_owned(),
            Account {
                subject: subject.clone(),
                password_hash,
            },
        );
        info!(subject = subject.as_str(), "identity provisioned");

        Ok(subject)
    }
}

#[cfg(test)]
mod tests {
    use enermina_application::IdentityProvider;
    use enermina_core::{AppError, AppResult};
    use enermina_domain::{EmailAddress, UserRole};

    use super::InMemoryIdentityDirectory;

    #[tokio::test]
    async fn provisioned_identities_authenticate_with_their_password() -> AppResult<()> {
        let directory = InMemoryIdentityDirectory::new();
        let email = EmailAddress::new("new@enermina.org")?;

        let subject = directory.admin_create_user(&email, "secret123").await?;

        assert_eq!(
            directory.authenticate(&email, "secret123").await?,
            Some(subject)
        );
        assert_eq!(directory.authenticate(&email, "wrong-pass1").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn emails_are_provisioned_once() -> AppResult<()> {
        let directory = InMemoryIdentityDirectory::new();
        let email = EmailAddress::new("new@enermina.org")?;

        directory.admin_create_user(&email, "secret123").await?;
        let again = directory.admin_create_user(&email, "secret456").await;

        assert!(matches!(again, Err(AppError::AlreadyExists(_))));
        Ok(())
    }

    #[tokio::test]
    async fn group_membership_is_idempotent() -> AppResult<()> {
        let directory = InMemoryIdentityDirectory::new();

        directory
            .add_user_to_group("user-1", UserRole::Subscriber)
            .await?;
        directory
            .add_user_to_group("user-1", UserRole::Subscriber)
            .await?;
        directory
            .add_user_to_group("user-1", UserRole::Professional)
            .await?;

        let groups = directory.groups_of("user-1").await;
        assert_eq!(groups.len(), 2);
        assert!(groups.contains(&UserRole::Professional));
        assert!(directory.groups_of("user-2").await.is_empty());
        Ok(())
    }
}

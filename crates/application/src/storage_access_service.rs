use enermina_core::AppResult;
use enermina_domain::Subject;
use enermina_domain::storage::{StorageAction, StoragePath, evaluate_storage_access};
use serde::Serialize;

use crate::authorization_service::require_allowed;

/// Access granted on a blob path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageGrant {
    /// Normalized blob path.
    pub path: String,
    /// Granted action.
    pub action: StorageAction,
}

/// Application service deciding blob access by path prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageAccessService;

impl StorageAccessService {
    /// Creates a new storage access service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Authorizes an action on a raw blob path.
    pub fn authorize(
        &self,
        subject: &Subject,
        raw_path: &str,
        action: StorageAction,
    ) -> AppResult<StorageGrant> {
        let path = StoragePath::parse(raw_path)?;
        let target = path.to_string();
        require_allowed(
            evaluate_storage_access(subject, &path, action),
            subject,
            action,
            &target,
        )?;

        Ok(StorageGrant {
            path: target,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use enermina_core::AppError;
    use enermina_domain::storage::StorageAction;
    use enermina_domain::{Subject, UserRole};

    use super::StorageAccessService;
    use crate::test_support::member;

    #[test]
    fn guests_download_but_never_upload() {
        let service = StorageAccessService::new();

        let grant = service
            .authorize(&Subject::Guest, "articles/cover.png", StorageAction::Read)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(grant.path, "articles/cover.png");

        let denied = service.authorize(&Subject::Guest, "users/me.png", StorageAction::Write);
        assert!(matches!(denied, Err(AppError::NotAuthorized(message)) if message.contains("users/me.png")));
    }

    #[test]
    fn business_uploads_need_a_professional() {
        let service = StorageAccessService::new();

        assert!(
            service
                .authorize(
                    &member("pro-1", &[UserRole::Professional]),
                    "businesses/logo.png",
                    StorageAction::Write,
                )
                .is_ok()
        );
        assert!(matches!(
            service.authorize(
                &member("user-1", &[UserRole::Subscriber]),
                "businesses/logo.png",
                StorageAction::Write,
            ),
            Err(AppError::NotAuthorized(_))
        ));
    }

    #[test]
    fn malformed_paths_are_validation_errors() {
        let service = StorageAccessService::new();

        assert!(matches!(
            service.authorize(&Subject::System, "users/../secrets", StorageAction::Read),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.authorize(&Subject::System, "private/x.png", StorageAction::Read),
            Err(AppError::NotAuthorized(_))
        ));
    }
}

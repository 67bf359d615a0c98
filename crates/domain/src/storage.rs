use std::fmt::{Display, Formatter};

use enermina_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::policy::{Decision, DenyReason, OwnerCheck, Policy, PolicyOperation, SubjectMatcher};
use crate::{Subject, UserRole};

/// Actions on stored blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageAction {
    /// Download or list.
    Read,
    /// Upload or overwrite.
    Write,
    /// Remove.
    Delete,
}

impl PolicyOperation for StorageAction {
    fn label(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
        }
    }
}

/// Top-level storage area a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoragePrefix {
    /// `users/*`
    Users,
    /// `articles/*`
    Articles,
    /// `businesses/*`
    Businesses,
    /// `resources/*`
    Resources,
}

impl StoragePrefix {
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "users" => Some(Self::Users),
            "articles" => Some(Self::Articles),
            "businesses" => Some(Self::Businesses),
            "resources" => Some(Self::Resources),
            _ => None,
        }
    }

    /// Returns the path segment of this prefix.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Articles => "articles",
            Self::Businesses => "businesses",
            Self::Resources => "resources",
        }
    }

    fn policy(self) -> Policy<StorageAction> {
        use StorageAction::{Delete, Read, Write};

        let everything = &[Read, Write, Delete];
        match self {
            Self::Users => Policy::default()
                .allow(
                    SubjectMatcher::Groups(vec![
                        UserRole::Admin,
                        UserRole::Professional,
                        UserRole::Subscriber,
                    ]),
                    everything,
                )
                .allow(SubjectMatcher::Authenticated, everything)
                .allow(SubjectMatcher::Guest, &[Read]),
            Self::Articles => Policy::default()
                .allow(SubjectMatcher::Groups(vec![UserRole::Admin]), everything)
                .allow(
                    SubjectMatcher::Groups(vec![UserRole::Subscriber, UserRole::Professional]),
                    &[Read],
                )
                .allow(SubjectMatcher::Authenticated, &[Read])
                .allow(SubjectMatcher::Guest, &[Read]),
            Self::Businesses | Self::Resources => Policy::default()
                .allow(
                    SubjectMatcher::Groups(vec![UserRole::Admin, UserRole::Professional]),
                    everything,
                )
                .allow(SubjectMatcher::Groups(vec![UserRole::Subscriber]), &[Read])
                .allow(SubjectMatcher::Authenticated, &[Read])
                .allow(SubjectMatcher::Guest, &[Read]),
        }
    }
}

/// Validated blob path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    raw: String,
    prefix: Option<StoragePrefix>,
}

impl StoragePath {
    /// Parses a slash-separated blob path.
    ///
    /// Empty segments and parent references are rejected so a path can never
    /// escape its prefix. Unknown prefixes parse but match no policy.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let segments: Vec<&str> = raw.split('/').collect();
        if segments.len() < 2 {
            return Err(AppError::Validation(format!(
                "storage path '{raw}' must have a prefix and an object name"
            )));
        }

        if segments
            .iter()
            .any(|segment| segment.is_empty() || *segment == "." || *segment == "..")
        {
            return Err(AppError::Validation(format!(
                "storage path '{raw}' contains an empty or relative segment"
            )));
        }

        Ok(Self {
            raw: raw.to_owned(),
            prefix: segments.first().and_then(|first| StoragePrefix::from_segment(first)),
        })
    }

    /// Returns the matched prefix, if the path is under a known area.
    #[must_use]
    pub fn prefix(&self) -> Option<StoragePrefix> {
        self.prefix
    }
}

impl Display for StoragePath {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.raw)
    }
}

/// Decides whether the subject may act on the blob path.
#[must_use]
pub fn evaluate_storage_access(
    subject: &Subject,
    path: &StoragePath,
    action: StorageAction,
) -> Decision {
    match path.prefix() {
        Some(prefix) => prefix
            .policy()
            .evaluate(subject, action, OwnerCheck::NotApplicable),
        None => Decision::Deny(DenyReason::NotAuthorized),
    }
}

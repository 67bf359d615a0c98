use std::collections::BTreeSet;

use enermina_core::UserIdentity;

use crate::UserRole;

/// Caller on whose behalf an operation is evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// No identity.
    Guest,
    /// Identity asserted by the identity provider, with its group memberships.
    Authenticated {
        /// Provider identity.
        identity: UserIdentity,
        /// Group memberships.
        groups: BTreeSet<UserRole>,
    },
    /// Server-side caller such as the post-registration trigger.
    System,
}

impl Subject {
    /// Creates an authenticated subject.
    #[must_use]
    pub fn authenticated(identity: UserIdentity, groups: impl IntoIterator<Item = UserRole>) -> Self {
        Self::Authenticated {
            identity,
            groups: groups.into_iter().collect(),
        }
    }

    /// Returns the identity subject claim, if any.
    #[must_use]
    pub fn identity_id(&self) -> Option<&str> {
        match self {
            Self::Authenticated { identity, .. } => Some(identity.subject()),
            Self::Guest | Self::System => None,
        }
    }

    /// Returns true when the subject is a member of the group.
    #[must_use]
    pub fn in_group(&self, role: UserRole) -> bool {
        match self {
            Self::Authenticated { groups, .. } => groups.contains(&role),
            Self::Guest | Self::System => false,
        }
    }

    /// Returns a short label for logs.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Guest => "guest".to_owned(),
            Self::System => "system".to_owned(),
            Self::Authenticated { identity, .. } => identity.subject().to_owned(),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::policy::{Decision, OwnerCheck, Policy, PolicyOperation, SubjectMatcher};
use crate::{Subject, UserRole};

/// Server-side mutations exposed next to the record API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GatewayMutation {
    /// Add an identity to a provider group.
    AddUserToGroup,
    /// Provision an identity with a password.
    AdminCreateUser,
    /// Upsert a search document.
    AddOrUpdateSearchableRecord,
    /// Remove a search document.
    DeleteSearchableRecord,
    /// Issue a realtime messaging token.
    CreateStreamToken,
    /// Relay a contact form to support.
    SupportContactEmail,
}

impl PolicyOperation for GatewayMutation {
    fn label(self) -> &'static str {
        match self {
            Self::AddUserToGroup => "addUserToGroup",
            Self::AdminCreateUser => "adminCreateUser",
            Self::AddOrUpdateSearchableRecord => "addOrUpdateSearchableRecord",
            Self::DeleteSearchableRecord => "deleteSearchableRecord",
            Self::CreateStreamToken => "createStreamToken",
            Self::SupportContactEmail => "supportContactEmail",
        }
    }
}

/// Returns the access policy of the gateway mutations.
#[must_use]
pub fn gateway_policy() -> Policy<GatewayMutation> {
    use GatewayMutation::{
        AddOrUpdateSearchableRecord, AddUserToGroup, AdminCreateUser, CreateStreamToken,
        DeleteSearchableRecord, SupportContactEmail,
    };

    Policy::default()
        .allow(
            SubjectMatcher::Authenticated,
            &[
                AddUserToGroup,
                AddOrUpdateSearchableRecord,
                DeleteSearchableRecord,
                CreateStreamToken,
                SupportContactEmail,
            ],
        )
        .allow(SubjectMatcher::Groups(vec![UserRole::Admin]), &[AdminCreateUser])
        .allow(SubjectMatcher::Guest, &[SupportContactEmail])
}

/// Decides whether the subject may invoke the mutation.
#[must_use]
pub fn evaluate_gateway_access(subject: &Subject, mutation: GatewayMutation) -> Decision {
    gateway_policy().evaluate(subject, mutation, OwnerCheck::NotApplicable)
}

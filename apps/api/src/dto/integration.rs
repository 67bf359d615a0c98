use enermina_application::{MutationReceipt, PostConfirmationInput, SupportContactInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Incoming group membership change.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/add-user-to-group-request.ts"
)]
pub struct AddUserToGroupRequest {
    pub auth_id: String,
    pub group_name: String,
}

/// Incoming identity provisioning request.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/admin-create-user-request.ts"
)]
pub struct AdminCreateUserRequest {
    pub email: String,
    pub password: String,
}

/// Incoming search document upsert.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/searchable-record-request.ts"
)]
pub struct SearchableRecordRequest {
    pub index_name: String,
    #[serde(rename = "objectID")]
    pub object_id: String,
    #[ts(type = "Record<string, unknown>")]
    pub body: Value,
}

/// Incoming search document removal.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/delete-searchable-record-request.ts"
)]
pub struct DeleteSearchableRecordRequest {
    pub index_name: String,
    #[serde(rename = "objectID")]
    pub object_id: String,
}

/// Incoming realtime token request.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-stream-token-request.ts"
)]
pub struct CreateStreamTokenRequest {
    pub user_id: String,
}

/// Incoming support contact form.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/support-contact-request.ts"
)]
pub struct SupportContactRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub reason: String,
    pub subject: Option<String>,
    pub message: String,
}

/// Sign-up confirmation forwarded by the identity provider.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/post-confirmation-request.ts"
)]
pub struct PostConfirmationRequest {
    pub auth_id: String,
    pub email: String,
    pub name: Option<String>,
}

/// Result payload of every gateway mutation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/mutation-response.ts"
)]
pub struct MutationResponse {
    pub content: String,
}

impl From<SupportContactRequest> for SupportContactInput {
    fn from(value: SupportContactRequest) -> Self {
        Self {
            name: value.name,
            email: value.email,
            phone: value.phone,
            reason: value.reason,
            subject: value.subject,
            message: value.message,
        }
    }
}

impl From<PostConfirmationRequest> for PostConfirmationInput {
    fn from(value: PostConfirmationRequest) -> Self {
        Self {
            auth_id: value.auth_id,
            email: value.email,
            name: value.name,
        }
    }
}

impl From<MutationReceipt> for MutationResponse {
    fn from(value: MutationReceipt) -> Self {
        Self {
            content: value.content,
        }
    }
}

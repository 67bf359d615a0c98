use enermina_core::AppError;
use enermina_domain::{DenyReason, ListingScope, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Incoming record create payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-record-request.ts"
)]
pub struct CreateRecordRequest {
    #[ts(type = "Record<string, unknown>")]
    pub data: Value,
}

/// Incoming record update payload. Only the listed fields change.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-record-request.ts"
)]
pub struct UpdateRecordRequest {
    #[ts(type = "Record<string, unknown>")]
    pub data: Value,
}

/// API representation of a stored record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/record-response.ts"
)]
pub struct RecordResponse {
    pub entity_type: String,
    pub key: String,
    #[ts(type = "number")]
    pub version: u64,
    #[ts(type = "Record<string, unknown>")]
    pub data: Value,
}

/// Records a live subscription of the caller may deliver.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/subscription-scope-response.ts"
)]
pub struct SubscriptionScopeResponse {
    #[ts(type = "\"all\" | \"owned\"")]
    pub scope: &'static str,
    pub owner_id: Option<String>,
}

impl From<Record> for RecordResponse {
    fn from(value: Record) -> Self {
        Self {
            entity_type: value.entity_type().as_str().to_owned(),
            key: value.key().to_string(),
            version: value.version(),
            data: Value::Object(value.into_data()),
        }
    }
}

impl TryFrom<ListingScope> for SubscriptionScopeResponse {
    type Error = AppError;

    fn try_from(value: ListingScope) -> Result<Self, Self::Error> {
        match value {
            ListingScope::All => Ok(Self {
                scope: "all",
                owner_id: None,
            }),
            ListingScope::Owned(owner_id) => Ok(Self {
                scope: "owned",
                owner_id: Some(owner_id),
            }),
            ListingScope::Denied(DenyReason::OperationDisabled) => Err(
                AppError::OperationDisabled("subscriptions are disabled".to_owned()),
            ),
            ListingScope::Denied(DenyReason::NotAuthorized) => Err(AppError::NotAuthorized(
                "subscription is not permitted".to_owned(),
            )),
        }
    }
}

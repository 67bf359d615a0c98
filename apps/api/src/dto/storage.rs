use enermina_application::StorageGrant;
use enermina_domain::storage::StorageAction;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming blob access check.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/storage-access-request.ts"
)]
pub struct StorageAccessRequest {
    pub path: String,
    #[ts(type = "\"read\" | \"write\" | \"delete\"")]
    pub action: StorageAction,
}

/// Access granted on a blob path.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/storage-grant-response.ts"
)]
pub struct StorageGrantResponse {
    pub path: String,
    #[ts(type = "\"read\" | \"write\" | \"delete\"")]
    pub action: StorageAction,
}

impl From<StorageGrant> for StorageGrantResponse {
    fn from(value: StorageGrant) -> Self {
        Self {
            path: value.path,
            action: value.action,
        }
    }
}

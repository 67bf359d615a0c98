use serde::Deserialize;
use ts_rs::TS;

/// Incoming lifecycle event for a stateful record.
///
/// `reason` carries the processor message of a failed payment or the
/// delivery error of a failed notification.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/transition-request.ts"
)]
pub struct TransitionRequest {
    pub event: String,
    pub reason: Option<String>,
}

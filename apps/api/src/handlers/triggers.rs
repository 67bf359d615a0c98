use axum::Json;
use axum::extract::State;

use crate::dto::{PostConfirmationRequest, RecordResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Creates the user record of a confirmed sign-up.
///
/// Called by the identity provider after confirmation. Repeated deliveries
/// return the record created by the first one.
pub async fn post_confirmation_handler(
    State(state): State<AppState>,
    Json(payload): Json<PostConfirmationRequest>,
) -> ApiResult<Json<RecordResponse>> {
    let record = state
        .integration_service
        .handle_post_confirmation(payload.into())
        .await?;

    Ok(Json(RecordResponse::from(record)))
}

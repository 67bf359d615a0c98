use axum::Json;
use axum::extract::{Extension, State};
use enermina_domain::Subject;

use crate::dto::{StorageAccessRequest, StorageGrantResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn storage_access_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(payload): Json<StorageAccessRequest>,
) -> ApiResult<Json<StorageGrantResponse>> {
    let grant = state
        .storage_access_service
        .authorize(&subject, &payload.path, payload.action)?;

    Ok(Json(StorageGrantResponse::from(grant)))
}

use axum::Json;
use axum::extract::{Extension, State};
use enermina_domain::Subject;

use crate::dto::{
    AddUserToGroupRequest, AdminCreateUserRequest, CreateStreamTokenRequest,
    DeleteSearchableRecordRequest, MutationResponse, SearchableRecordRequest,
    SupportContactRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn add_user_to_group_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(payload): Json<AddUserToGroupRequest>,
) -> ApiResult<Json<MutationResponse>> {
    let receipt = state
        .integration_service
        .add_user_to_group(&subject, &payload.auth_id, &payload.group_name)
        .await?;

    Ok(Json(MutationResponse::from(receipt)))
}

pub async fn admin_create_user_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(payload): Json<AdminCreateUserRequest>,
) -> ApiResult<Json<MutationResponse>> {
    let receipt = state
        .integration_service
        .admin_create_user(&subject, &payload.email, &payload.password)
        .await?;

    Ok(Json(MutationResponse::from(receipt)))
}

pub async fn add_or_update_searchable_record_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(payload): Json<SearchableRecordRequest>,
) -> ApiResult<Json<MutationResponse>> {
    let receipt = state
        .integration_service
        .add_or_update_searchable_record(
            &subject,
            &payload.index_name,
            &payload.object_id,
            payload.body,
        )
        .await?;

    Ok(Json(MutationResponse::from(receipt)))
}

pub async fn delete_searchable_record_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(payload): Json<DeleteSearchableRecordRequest>,
) -> ApiResult<Json<MutationResponse>> {
    let receipt = state
        .integration_service
        .delete_searchable_record(&subject, &payload.index_name, &payload.object_id)
        .await?;

    Ok(Json(MutationResponse::from(receipt)))
}

pub async fn create_stream_token_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(payload): Json<CreateStreamTokenRequest>,
) -> ApiResult<Json<MutationResponse>> {
    let receipt = state
        .integration_service
        .create_stream_token(&subject, &payload.user_id)
        .await?;

    Ok(Json(MutationResponse::from(receipt)))
}

pub async fn support_contact_email_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(payload): Json<SupportContactRequest>,
) -> ApiResult<Json<MutationResponse>> {
    let receipt = state
        .integration_service
        .support_contact_email(&subject, payload.into())
        .await?;

    Ok(Json(MutationResponse::from(receipt)))
}

use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use enermina_application::RecordListQuery;
use enermina_core::AppError;
use enermina_domain::{EntityType, RecordKey, Subject};

use crate::dto::{
    CreateRecordRequest, RecordResponse, SubscriptionScopeResponse, UpdateRecordRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, serde::Deserialize)]
pub struct RecordListParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn list_records_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(entity_name): Path<String>,
    Query(params): Query<RecordListParams>,
) -> ApiResult<Json<Vec<RecordResponse>>> {
    let records = state
        .record_service
        .list_records(
            &subject,
            parse_entity_type(&entity_name)?,
            RecordListQuery {
                limit: params
                    .limit
                    .unwrap_or(DEFAULT_PAGE_SIZE)
                    .clamp(1, MAX_PAGE_SIZE),
                offset: params.offset.unwrap_or(0),
            },
        )
        .await?
        .into_iter()
        .map(RecordResponse::from)
        .collect();

    Ok(Json(records))
}

pub async fn create_record_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(entity_name): Path<String>,
    Json(payload): Json<CreateRecordRequest>,
) -> ApiResult<(StatusCode, Json<RecordResponse>)> {
    let record = state
        .record_service
        .create_record(&subject, parse_entity_type(&entity_name)?, payload.data)
        .await?;

    Ok((StatusCode::CREATED, Json(RecordResponse::from(record))))
}

pub async fn get_record_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((entity_name, key)): Path<(String, String)>,
) -> ApiResult<Json<RecordResponse>> {
    let record = state
        .record_service
        .get_record(
            &subject,
            parse_entity_type(&entity_name)?,
            &RecordKey::from_str(&key)?,
        )
        .await?;

    Ok(Json(RecordResponse::from(record)))
}

pub async fn update_record_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((entity_name, key)): Path<(String, String)>,
    Json(payload): Json<UpdateRecordRequest>,
) -> ApiResult<Json<RecordResponse>> {
    let record = state
        .record_service
        .update_record(
            &subject,
            parse_entity_type(&entity_name)?,
            &RecordKey::from_str(&key)?,
            payload.data,
        )
        .await?;

    Ok(Json(RecordResponse::from(record)))
}

pub async fn delete_record_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((entity_name, key)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .record_service
        .delete_record(
            &subject,
            parse_entity_type(&entity_name)?,
            &RecordKey::from_str(&key)?,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn related_records_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((entity_name, key, relationship)): Path<(String, String, String)>,
) -> ApiResult<Json<Vec<RecordResponse>>> {
    let records = state
        .record_service
        .related_records(
            &subject,
            parse_entity_type(&entity_name)?,
            &RecordKey::from_str(&key)?,
            relationship.as_str(),
        )
        .await?
        .into_iter()
        .map(RecordResponse::from)
        .collect();

    Ok(Json(records))
}

pub async fn subscription_scope_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(entity_name): Path<String>,
) -> ApiResult<Json<SubscriptionScopeResponse>> {
    let scope = state
        .record_service
        .subscription_scope(&subject, parse_entity_type(&entity_name)?)?;

    Ok(Json(SubscriptionScopeResponse::try_from(scope)?))
}

pub async fn resource_download_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(key): Path<String>,
) -> ApiResult<Json<RecordResponse>> {
    let record = state
        .record_service
        .record_download(&subject, &RecordKey::from_str(&key)?)
        .await?;

    Ok(Json(RecordResponse::from(record)))
}

pub(crate) fn parse_entity_type(name: &str) -> Result<EntityType, AppError> {
    EntityType::from_str(name)
        .map_err(|_| AppError::NotFound(format!("unknown entity type '{name}'")))
}

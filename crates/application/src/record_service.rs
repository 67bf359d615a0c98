use std::collections::HashMap;
use std::sync::Arc;

use enermina_core::{AppError, AppResult};
use enermina_domain::relationship::{Reference, Relationship, outgoing_references};
use enermina_domain::schema::{OwnerField, SOFT_DELETE_FIELD};
use enermina_domain::{
    EntitySchema, EntityType, InvoiceStatus, ListingScope, Operation, Record, RecordKey, Subject,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::AuthorizationService;
use crate::record_ports::{RecordListQuery, RecordStore, RecordWrite, WriteBatch};

mod create;
mod delete;
mod read;
mod references;
mod relationships;
mod update;

/// Application service for generic record operations.
///
/// Every operation authorizes the subject against the entity policy,
/// validates the payload against the entity schema and commits one atomic
/// write batch guarded by the versions it read.
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    authorization_service: AuthorizationService,
}

impl RecordService {
    /// Creates a new record service.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, authorization_service: AuthorizationService) -> Self {
        Self {
            store,
            authorization_service,
        }
    }

    async fn require_record(&self, entity_type: EntityType, key: &RecordKey) -> AppResult<Record> {
        self.store.find(entity_type, key).await?.ok_or_else(|| {
            AppError::NotFound(format!("{} '{key}' does not exist", entity_type.as_str()))
        })
    }

    async fn commit_one(&self, batch: WriteBatch) -> AppResult<Record> {
        self.store
            .commit(batch)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("record store returned no written record".to_owned()))
    }
}

/// Requires a request payload to be a JSON object.
pub(crate) fn payload_object(payload: Value) -> AppResult<Map<String, Value>> {
    match payload {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Validation(format!(
            "record payload must be a JSON object, got {other}"
        ))),
    }
}

/// Counter on a liked item that mirrors its number of likes.
fn like_counter(entity_type: EntityType) -> Option<&'static str> {
    match entity_type {
        EntityType::Article => Some("likeCount"),
        EntityType::Business | EntityType::Resource => Some("likes"),
        _ => None,
    }
}

#[cfg(test)]
mod tests;

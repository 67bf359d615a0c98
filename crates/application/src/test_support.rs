use std::collections::BTreeMap;

use async_trait::async_trait;
use enermina_core::{AppError, AppResult, UserIdentity};
use enermina_domain::{EntityType, Record, RecordKey, SchemaCatalog, Subject, UserRole};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::{RecordListQuery, RecordStore, RecordWrite, WriteBatch};

type Records = BTreeMap<(EntityType, RecordKey), Record>;

/// Record store applying batches to a copy and swapping it in on success.
#[derive(Default)]
pub(crate) struct FakeRecordStore {
    records: Mutex<Records>,
    commits: Mutex<usize>,
}

impl FakeRecordStore {
    /// Stores a record directly, keyed through the standard catalog.
    pub(crate) async fn seed(&self, entity_type: EntityType, data: Value) -> Record {
        let data = object(data);
        let key = SchemaCatalog::standard()
            .schema(entity_type)
            .and_then(|schema| schema.key_of(&data))
            .unwrap_or_else(|_| unreachable!());
        let record = Record::new(entity_type, key.clone(), data, 1);
        self.records
            .lock()
            .await
            .insert((entity_type, key), record.clone());
        record
    }

    pub(crate) async fn stored(&self, entity_type: EntityType, key: &str) -> Option<Record> {
        let key = key.parse::<RecordKey>().ok()?;
        self.records.lock().await.get(&(entity_type, key)).cloned()
    }

    pub(crate) async fn commit_count(&self) -> usize {
        *self.commits.lock().await
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn find(&self, entity_type: EntityType, key: &RecordKey) -> AppResult<Option<Record>> {
        Ok(self
            .records
            .lock()
            .await
            .get(&(entity_type, key.clone()))
            .cloned())
    }

    async fn find_by_field(
        &self,
        entity_type: EntityType,
        field: &str,
        value: &str,
    ) -> AppResult<Vec<Record>> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .filter(|record| record.entity_type() == entity_type)
            .filter(|record| {
                record
                    .data()
                    .get(field)
                    .and_then(enermina_domain::record::index_value)
                    .is_some_and(|stored| stored == value)
            })
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        entity_type: EntityType,
        query: RecordListQuery,
    ) -> AppResult<Vec<Record>> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .filter(|record| record.entity_type() == entity_type)
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> AppResult<Vec<Record>> {
        let mut records = self.records.lock().await;
        let mut staged = (*records).clone();
        let mut written = Vec::new();

        for write in batch.into_writes() {
            if let Some(record) = apply(&mut staged, write)? {
                written.push(record);
            }
        }

        *records = staged;
        *self.commits.lock().await += 1;
        Ok(written)
    }
}

fn apply(records: &mut Records, write: RecordWrite) -> AppResult<Option<Record>> {
    let slot = (write.entity_type(), write.key().clone());
    match write {
        RecordWrite::Insert {
            entity_type,
            key,
            data,
        } => {
            if records.contains_key(&slot) {
                return Err(AppError::AlreadyExists(format!(
                    "{} '{key}'",
                    entity_type.as_str()
                )));
            }
            let record = Record::new(entity_type, key, data, 1);
            records.insert(slot, record.clone());
            Ok(Some(record))
        }
        RecordWrite::Replace {
            data,
            expected_version,
            ..
        } => {
            let current = current(records, &slot, expected_version)?;
            let record = current.with_data(data, current.version() + 1);
            records.insert(slot, record.clone());
            Ok(Some(record))
        }
        RecordWrite::Delete {
            expected_version, ..
        } => {
            current(records, &slot, expected_version)?;
            records.remove(&slot);
            Ok(None)
        }
        RecordWrite::AdjustCounter {
            field,
            delta,
            floor,
            ceiling_field,
            ..
        } => {
            let current = records
                .get(&slot)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("record '{}'", slot.1)))?;
            let next = current.integer(field).unwrap_or(0) + delta;
            let ceiling = ceiling_field.and_then(|ceiling| current.integer(ceiling));
            if floor.is_some_and(|floor| next < floor) || ceiling.is_some_and(|ceiling| next > ceiling)
            {
                return Err(AppError::PreconditionFailed(format!(
                    "counter '{field}' out of bounds"
                )));
            }
            let mut data = current.data().clone();
            data.insert(field.to_owned(), Value::from(next));
            let record = current.with_data(data, current.version() + 1);
            records.insert(slot, record.clone());
            Ok(Some(record))
        }
        RecordWrite::Expect { version, .. } => {
            exists(records, &slot)?;
            current(records, &slot, version)?;
            Ok(None)
        }
        RecordWrite::Exists { .. } => {
            exists(records, &slot)?;
            Ok(None)
        }
    }
}

fn exists(records: &Records, slot: &(EntityType, RecordKey)) -> AppResult<()> {
    if records.contains_key(slot) {
        Ok(())
    } else {
        Err(AppError::PreconditionFailed(format!(
            "record '{}' no longer exists",
            slot.1
        )))
    }
}

fn current(records: &Records, slot: &(EntityType, RecordKey), version: u64) -> AppResult<Record> {
    match records.get(slot) {
        Some(record) if record.version() == version => Ok(record.clone()),
        Some(_) => Err(AppError::PreconditionFailed(format!(
            "record '{}' changed since it was read",
            slot.1
        ))),
        None => Err(AppError::NotFound(format!("record '{}'", slot.1))),
    }
}

pub(crate) fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

pub(crate) fn member(id: &str, groups: &[UserRole]) -> Subject {
    Subject::authenticated(UserIdentity::new(id, None), groups.iter().copied())
}

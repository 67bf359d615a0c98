use super::*;
use crate::record_counters::{CounterBounds, adjusted_counter, record_label};

impl InMemoryRecordStore {
    /// Applies one write in place, returning the written record.
    ///
    /// Slots are remembered in the undo log before their first change.
    pub(super) fn apply(
        &self,
        state: &mut StoreState,
        undo: &mut UndoLog,
        write: RecordWrite,
    ) -> AppResult<Option<Record>> {
        match write {
            RecordWrite::Insert {
                entity_type,
                key,
                data,
            } => {
                if state.record(entity_type, &key).is_some() {
                    return Err(AppError::AlreadyExists(format!(
                        "{} '{key}' already exists",
                        entity_type.as_str()
                    )));
                }
                remember(state, undo, entity_type, &key);
                self.index(state, entity_type, &key, &data)?;
                let record = Record::new(entity_type, key.clone(), data, 1);
                store(state, record.clone());
                Ok(Some(record))
            }
            RecordWrite::Replace {
                entity_type,
                key,
                data,
                expected_version,
            } => {
                let current = versioned(state, entity_type, &key, expected_version)?;
                remember(state, undo, entity_type, &key);
                self.unindex(state, entity_type, &key, current.data());
                self.index(state, entity_type, &key, &data)?;
                let record = current.with_data(data, current.version() + 1);
                store(state, record.clone());
                Ok(Some(record))
            }
            RecordWrite::Delete {
                entity_type,
                key,
                expected_version,
            } => {
                let current = versioned(state, entity_type, &key, expected_version)?;
                remember(state, undo, entity_type, &key);
                self.unindex(state, entity_type, &key, current.data());
                if let Some(records) = state.records.get_mut(&entity_type) {
                    records.remove(&key);
                }
                Ok(None)
            }
            RecordWrite::AdjustCounter {
                entity_type,
                key,
                field,
                delta,
                floor,
                ceiling_field,
            } => {
                let current = state
                    .record(entity_type, &key)
                    .cloned()
                    .ok_or_else(|| missing(entity_type, &key))?;
                let data = adjusted_counter(
                    &current,
                    field,
                    delta,
                    CounterBounds {
                        floor,
                        ceiling_field,
                    },
                )?;
                remember(state, undo, entity_type, &key);
                self.unindex(state, entity_type, &key, current.data());
                self.index(state, entity_type, &key, &data)?;
                let record = current.with_data(data, current.version() + 1);
                store(state, record.clone());
                Ok(Some(record))
            }
            RecordWrite::Expect {
                entity_type,
                key,
                version,
            } => {
                let current = state.record(entity_type, &key).ok_or_else(|| {
                    AppError::PreconditionFailed(format!(
                        "{} '{key}' no longer exists",
                        entity_type.as_str()
                    ))
                })?;
                if current.version() != version {
                    return Err(AppError::PreconditionFailed(format!(
                        "{} changed concurrently",
                        record_label(current)
                    )));
                }
                Ok(None)
            }
            RecordWrite::Exists { entity_type, key } => {
                if state.record(entity_type, &key).is_none() {
                    return Err(AppError::PreconditionFailed(format!(
                        "{} '{key}' no longer exists",
                        entity_type.as_str()
                    )));
                }
                Ok(None)
            }
        }
    }
}

impl InMemoryRecordStore {
    /// Restores every slot of a failed batch and its index entries.
    pub(super) fn roll_back(&self, state: &mut StoreState, undo: UndoLog) {
        for (entity_type, key) in undo.keys() {
            if let Some(current) = state.record(*entity_type, key).cloned() {
                self.unindex(state, *entity_type, key, current.data());
            }
        }

        for ((entity_type, key), prior) in undo {
            match prior {
                Some(record) => {
                    self.insert_entries(state, entity_type, &key, record.data());
                    store(state, record);
                }
                None => {
                    if let Some(records) = state.records.get_mut(&entity_type) {
                        records.remove(&key);
                    }
                }
            }
        }
    }
}

fn remember(state: &StoreState, undo: &mut UndoLog, entity_type: EntityType, key: &RecordKey) {
    undo.entry((entity_type, key.clone()))
        .or_insert_with(|| state.record(entity_type, key).cloned());
}

fn store(state: &mut StoreState, record: Record) {
    state
        .records
        .entry(record.entity_type())
        .or_default()
        .insert(record.key().clone(), record);
}

fn versioned(
    state: &StoreState,
    entity_type: EntityType,
    key: &RecordKey,
    expected_version: u64,
) -> AppResult<Record> {
    let current = state
        .record(entity_type, key)
        .ok_or_else(|| missing(entity_type, key))?;
    if current.version() != expected_version {
        return Err(AppError::PreconditionFailed(format!(
            "{} is at version {}, expected {expected_version}",
            record_label(current),
            current.version()
        )));
    }
    Ok(current.clone())
}

use serde_json::Map;

use super::*;

impl InMemoryRecordStore {
    /// Returns an unconditional single-field index usable for lookups.
    pub(super) fn lookup_index(&self, entity_type: EntityType, field: &str) -> Option<usize> {
        self.indexes.iter().position(|index| {
            index.entity_type() == entity_type
                && index.fields() == [field]
                && index.only_when().is_none()
        })
    }

    pub(super) fn unindex(
        &self,
        state: &mut StoreState,
        entity_type: EntityType,
        key: &RecordKey,
        data: &Map<String, Value>,
    ) {
        for (position, index) in self.covering(entity_type) {
            let Some(entry) = index.entry(data) else {
                continue;
            };
            if let Some(entries) = state.entries.get_mut(&position)
                && let Some(keys) = entries.get_mut(&entry)
            {
                keys.remove(key);
                if keys.is_empty() {
                    entries.remove(&entry);
                }
            }
        }
    }

    /// Adds the record's entries, failing on a unique index collision.
    ///
    /// Collisions are checked before any entry is added.
    pub(super) fn index(
        &self,
        state: &mut StoreState,
        entity_type: EntityType,
        key: &RecordKey,
        data: &Map<String, Value>,
    ) -> AppResult<()> {
        for (position, index) in self.covering(entity_type) {
            if !index.is_unique() {
                continue;
            }
            let Some(entry) = index.entry(data) else {
                continue;
            };
            let taken = state
                .entries
                .get(&position)
                .and_then(|entries| entries.get(&entry))
                .is_some_and(|keys| keys.iter().any(|holder| holder != key));

            if taken {
                return Err(AppError::AlreadyExists(format!(
                    "{} with {} = ({}) already exists",
                    entity_type.as_str(),
                    index.fields().join(", "),
                    entry.join(", ")
                )));
            }
        }

        self.insert_entries(state, entity_type, key, data);
        Ok(())
    }

    pub(super) fn insert_entries(
        &self,
        state: &mut StoreState,
        entity_type: EntityType,
        key: &RecordKey,
        data: &Map<String, Value>,
    ) {
        for (position, index) in self.covering(entity_type) {
            let Some(entry) = index.entry(data) else {
                continue;
            };
            state
                .entries
                .entry(position)
                .or_default()
                .entry(entry)
                .or_default()
                .insert(key.clone());
        }
    }

    fn covering(&self, entity_type: EntityType) -> impl Iterator<Item = (usize, &IndexSpec)> {
        self.indexes
            .iter()
            .enumerate()
            .filter(move |(_, index)| index.entity_type() == entity_type)
    }
}

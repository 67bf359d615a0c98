use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use enermina_application::{RecordListQuery, RecordStore, RecordWrite, WriteBatch};
use enermina_core::{AppError, AppResult};
use enermina_domain::schema::IndexSpec;
use enermina_domain::{EntityType, Record, RecordKey, SchemaCatalog};
use serde_json::Value;
use tokio::sync::RwLock;

mod indexes;
mod write;


/// In-memory record store.
///
/// Every batch is applied in place under one write lock. The prior contents
/// of each touched slot are kept in an undo log and restored when a write
/// fails, so a batch costs what it touches.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    indexes: Vec<IndexSpec>,
    state: RwLock<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    records: HashMap<EntityType, BTreeMap<RecordKey, Record>>,
    // index position -> entry -> keys holding it
    entries: HashMap<usize, HashMap<Vec<String>, BTreeSet<RecordKey>>>,
}

/// Contents of every slot a batch touched, as of its first touch.
type UndoLog = BTreeMap<(EntityType, RecordKey), Option<Record>>;

impl InMemoryRecordStore {
    /// Creates an empty store maintaining the given secondary indexes.
    #[must_use]
    pub fn new(indexes: Vec<IndexSpec>) -> Self {
        Self {
            indexes,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Creates an empty store maintaining the catalog's index plan.
    #[must_use]
    pub fn for_catalog(catalog: &SchemaCatalog) -> Self {
        Self::new(catalog.index_plan())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find(&self, entity_type: EntityType, key: &RecordKey) -> AppResult<Option<Record>> {
        Ok(self.state.read().await.record(entity_type, key).cloned())
    }

    async fn find_by_field(
        &self,
        entity_type: EntityType,
        field: &str,
        value: &str,
    ) -> AppResult<Vec<Record>> {
        let state = self.state.read().await;

        if let Some(position) = self.lookup_index(entity_type, field) {
            let entry = vec![value.to_owned()];
            return Ok(state
                .entries
                .get(&position)
                .and_then(|entries| entries.get(&entry))
                .into_iter()
                .flatten()
                .filter_map(|key| state.record(entity_type, key))
                .cloned()
                .collect());
        }

        Ok(state
            .of_type(entity_type)
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
            .state
            .read()
            .await
            .of_type(entity_type)
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> AppResult<Vec<Record>> {
        let mut state = self.state.write().await;
        let mut undo = UndoLog::new();
        let mut written = Vec::new();

        for write in batch.into_writes() {
            match self.apply(&mut state, &mut undo, write) {
                Ok(Some(record)) => written.push(record),
                Ok(None) => {}
                Err(error) => {
                    self.roll_back(&mut state, undo);
                    return Err(error);
                }
            }
        }

        Ok(written)
    }
}

impl StoreState {
    fn record(&self, entity_type: EntityType, key: &RecordKey) -> Option<&Record> {
        self.records.get(&entity_type)?.get(key)
    }

    fn of_type(&self, entity_type: EntityType) -> impl Iterator<Item = &Record> {
        self.records
            .get(&entity_type)
            .into_iter()
            .flat_map(BTreeMap::values)
    }
}

fn missing(entity_type: EntityType, key: &RecordKey) -> AppError {
    AppError::NotFound(format!("{} '{key}' does not exist", entity_type.as_str()))
}

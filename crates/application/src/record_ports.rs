use async_trait::async_trait;
use enermina_core::AppResult;
use enermina_domain::{EntityType, Record, RecordKey};
use serde_json::{Map, Value};

/// Query inputs for record listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordListQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

/// One conditional write of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordWrite {
    /// Inserts a new record at version 1; fails with `AlreadyExists` when the
    /// key or a unique index entry is taken.
    Insert {
        /// Entity type.
        entity_type: EntityType,
        /// Record key.
        key: RecordKey,
        /// Record fields.
        data: Map<String, Value>,
    },
    /// Replaces a record's fields; fails with `PreconditionFailed` when the
    /// stored version differs.
    Replace {
        /// Entity type.
        entity_type: EntityType,
        /// Record key.
        key: RecordKey,
        /// New record fields.
        data: Map<String, Value>,
        /// Version read before the change.
        expected_version: u64,
    },
    /// Removes a record; fails with `PreconditionFailed` when the stored
    /// version differs.
    Delete {
        /// Entity type.
        entity_type: EntityType,
        /// Record key.
        key: RecordKey,
        /// Version read before the change.
        expected_version: u64,
    },
    /// Adds `delta` to an integer field; fails with `PreconditionFailed` when
    /// the result leaves the bounds.
    AdjustCounter {
        /// Entity type.
        entity_type: EntityType,
        /// Record key.
        key: RecordKey,
        /// Counter field.
        field: &'static str,
        /// Signed change.
        delta: i64,
        /// Inclusive lower bound.
        floor: Option<i64>,
        /// Field of the same record holding the inclusive upper bound.
        ceiling_field: Option<&'static str>,
    },
    /// Asserts a record is unchanged since it was read, without writing it.
    Expect {
        /// Entity type.
        entity_type: EntityType,
        /// Record key.
        key: RecordKey,
        /// Version read before the decision.
        version: u64,
    },
    /// Asserts a record still exists, whatever its version.
    Exists {
        /// Entity type.
        entity_type: EntityType,
        /// Record key.
        key: RecordKey,
    },
}

impl RecordWrite {
    /// Returns the targeted entity type.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Insert { entity_type, .. }
            | Self::Replace { entity_type, .. }
            | Self::Delete { entity_type, .. }
            | Self::AdjustCounter { entity_type, .. }
            | Self::Expect { entity_type, .. }
            | Self::Exists { entity_type, .. } => *entity_type,
        }
    }

    /// Returns the targeted key.
    #[must_use]
    pub fn key(&self) -> &RecordKey {
        match self {
            Self::Insert { key, .. }
            | Self::Replace { key, .. }
            | Self::Delete { key, .. }
            | Self::AdjustCounter { key, .. }
            | Self::Expect { key, .. }
            | Self::Exists { key, .. } => key,
        }
    }

    /// Guard asserting the record is still at the version it was read at.
    #[must_use]
    pub fn expect(record: &Record) -> Self {
        Self::Expect {
            entity_type: record.entity_type(),
            key: record.key().clone(),
            version: record.version(),
        }
    }

    /// Replaces a record read earlier, guarded by its version.
    #[must_use]
    pub fn replace(record: &Record, data: Map<String, Value>) -> Self {
        Self::Replace {
            entity_type: record.entity_type(),
            key: record.key().clone(),
            data,
            expected_version: record.version(),
        }
    }
}

/// Writes applied atomically: either every write lands or none does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<RecordWrite>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a write.
    pub fn push(&mut self, write: RecordWrite) {
        self.writes.push(write);
    }

    /// Appends several writes.
    pub fn extend(&mut self, writes: impl IntoIterator<Item = RecordWrite>) {
        self.writes.extend(writes);
    }

    /// Returns the writes in application order.
    #[must_use]
    pub fn writes(&self) -> &[RecordWrite] {
        self.writes.as_slice()
    }

    /// Consumes the batch.
    #[must_use]
    pub fn into_writes(self) -> Vec<RecordWrite> {
        self.writes
    }

    /// Returns true when the batch holds no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Durable record store port.
///
/// Implementations maintain the secondary indexes of the schema catalog's
/// index plan and enforce its unique indexes at commit.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Looks up a record by key.
    async fn find(&self, entity_type: EntityType, key: &RecordKey) -> AppResult<Option<Record>>;

    /// Returns records whose indexed field equals the value.
    async fn find_by_field(
        &self,
        entity_type: EntityType,
        field: &str,
        value: &str,
    ) -> AppResult<Vec<Record>>;

    /// Lists records of a type ordered by key.
    async fn list(&self, entity_type: EntityType, query: RecordListQuery)
    -> AppResult<Vec<Record>>;

    /// Applies a batch atomically.
    ///
    /// Returns the resulting record of every insert, replace and counter
    /// adjustment, in batch order.
    async fn commit(&self, batch: WriteBatch) -> AppResult<Vec<Record>>;
}

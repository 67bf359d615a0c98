use std::str::FromStr;

use async_trait::async_trait;
use enermina_application::{RecordListQuery, RecordStore, RecordWrite, WriteBatch};
use enermina_core::{AppError, AppResult};
use enermina_domain::schema::IndexSpec;
use enermina_domain::{EntityType, Record, RecordKey};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

mod commit;
mod indexes;


use indexes::index_statement;

/// PostgreSQL-backed record store keeping every entity in one JSONB table.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the expression indexes of the index plan that do not exist
    /// yet. Unique indexes enforce their constraint at commit time.
    pub async fn ensure_indexes(&self, plan: &[IndexSpec]) -> AppResult<()> {
        for index in plan {
            sqlx::query(index_statement(index).as_str())
                .execute(&self.pool)
                .await
                .map_err(|error| {
                    AppError::Internal(format!(
                        "failed to create record index '{}': {error}",
                        index.name()
                    ))
                })?;
        }

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    entity_type: String,
    record_key: String,
    data: Value,
    version: i64,
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn find(&self, entity_type: EntityType, key: &RecordKey) -> AppResult<Option<Record>> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT entity_type, record_key, data, version
            FROM records
            WHERE entity_type = $1 AND record_key = $2
            "#,
        )
        .bind(entity_type.as_str())
        .bind(key.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find {} '{key}': {error}",
                entity_type.as_str()
            ))
        })?;

        row.map(record_from_row).transpose()
    }

    async fn find_by_field(
        &self,
        entity_type: EntityType,
        field: &str,
        value: &str,
    ) -> AppResult<Vec<Record>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT entity_type, record_key, data, version
            FROM records
            WHERE entity_type = $1 AND data ->> $2 = $3
            ORDER BY record_key
            "#,
        )
        .bind(entity_type.as_str())
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to look up {} by '{field}': {error}",
                entity_type.as_str()
            ))
        })?;

        rows.into_iter().map(record_from_row).collect()
    }

    async fn list(
        &self,
        entity_type: EntityType,
        query: RecordListQuery,
    ) -> AppResult<Vec<Record>> {
        let limit = i64::try_from(query.limit).map_err(|error| {
            AppError::Validation(format!("invalid limit '{}': {error}", query.limit))
        })?;
        let offset = i64::try_from(query.offset).map_err(|error| {
            AppError::Validation(format!("invalid offset '{}': {error}", query.offset))
        })?;

        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT entity_type, record_key, data, version
            FROM records
            WHERE entity_type = $1
            ORDER BY record_key
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(entity_type.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list {} records: {error}",
                entity_type.as_str()
            ))
        })?;

        rows.into_iter().map(record_from_row).collect()
    }

    async fn commit(&self, batch: WriteBatch) -> AppResult<Vec<Record>> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start record batch transaction: {error}"))
        })?;

        let mut written = Vec::new();
        for write in batch.into_writes() {
            if let Some(record) = apply(&mut transaction, write).await? {
                written.push(record);
            }
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit record batch transaction: {error}"))
        })?;

        Ok(written)
    }
}

async fn apply(
    transaction: &mut Transaction<'_, Postgres>,
    write: RecordWrite,
) -> AppResult<Option<Record>> {
    match write {
        RecordWrite::Insert {
            entity_type,
            key,
            data,
        } => commit::insert(transaction, entity_type, &key, data).await.map(Some),
        RecordWrite::Replace {
            entity_type,
            key,
            data,
            expected_version,
        } => commit::replace(transaction, entity_type, &key, data, expected_version)
            .await
            .map(Some),
        RecordWrite::Delete {
            entity_type,
            key,
            expected_version,
        } => commit::delete(transaction, entity_type, &key, expected_version)
            .await
            .map(|()| None),
        RecordWrite::AdjustCounter {
            entity_type,
            key,
            field,
            delta,
            floor,
            ceiling_field,
        } => commit::adjust_counter(
            transaction,
            entity_type,
            &key,
            field,
            delta,
            crate::record_counters::CounterBounds {
                floor,
                ceiling_field,
            },
        )
        .await
        .map(Some),
        RecordWrite::Expect {
            entity_type,
            key,
            version,
        } => commit::expect(transaction, entity_type, &key, Some(version))
            .await
            .map(|()| None),
        RecordWrite::Exists { entity_type, key } => {
            commit::expect(transaction, entity_type, &key, None)
                .await
                .map(|()| None)
        }
    }
}

fn record_from_row(row: RecordRow) -> AppResult<Record> {
    let entity_type = EntityType::from_str(row.entity_type.as_str())?;
    let key = RecordKey::from_str(row.record_key.as_str())?;
    let Value::Object(data) = row.data else {
        return Err(AppError::Internal(format!(
            "{} '{key}' holds a non-object payload",
            entity_type.as_str()
        )));
    };
    let version = u64::try_from(row.version).map_err(|error| {
        AppError::Internal(format!(
            "{} '{key}' has an invalid version: {error}",
            entity_type.as_str()
        ))
    })?;

    Ok(Record::new(entity_type, key, data, version))
}

fn version_param(version: u64) -> AppResult<i64> {
    i64::try_from(version)
        .map_err(|error| AppError::Validation(format!("invalid record version {version}: {error}")))
}

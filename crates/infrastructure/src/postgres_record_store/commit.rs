use serde_json::Map;

use super::*;
use crate::record_counters::{CounterBounds, adjusted_counter};

pub(super) async fn insert(
    transaction: &mut Transaction<'_, Postgres>,
    entity_type: EntityType,
    key: &RecordKey,
    data: Map<String, Value>,
) -> AppResult<Record> {
    let row = sqlx::query_as::<_, RecordRow>(
        r#"
        INSERT INTO records (entity_type, record_key, data, version)
        VALUES ($1, $2, $3, 1)
        RETURNING entity_type, record_key, data, version
        "#,
    )
    .bind(entity_type.as_str())
    .bind(key.to_string())
    .bind(Value::Object(data))
    .fetch_one(&mut **transaction)
    .await
    .map_err(|error| write_error(error, "insert", entity_type, key))?;

    record_from_row(row)
}

pub(super) async fn replace(
    transaction: &mut Transaction<'_, Postgres>,
    entity_type: EntityType,
    key: &RecordKey,
    data: Map<String, Value>,
    expected_version: u64,
) -> AppResult<Record> {
    let row = sqlx::query_as::<_, RecordRow>(
        r#"
        UPDATE records
        SET data = $3,
            version = version + 1,
            updated_at = now()
        WHERE entity_type = $1 AND record_key = $2 AND version = $4
        RETURNING entity_type, record_key, data, version
        "#,
    )
    .bind(entity_type.as_str())
    .bind(key.to_string())
    .bind(Value::Object(data))
    .bind(version_param(expected_version)?)
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| write_error(error, "replace", entity_type, key))?;

    match row {
        Some(row) => record_from_row(row),
        None => Err(version_mismatch(transaction, entity_type, key, expected_version).await),
    }
}

pub(super) async fn delete(
    transaction: &mut Transaction<'_, Postgres>,
    entity_type: EntityType,
    key: &RecordKey,
    expected_version: u64,
) -> AppResult<()> {
    let deleted = sqlx::query(
        r#"
        DELETE FROM records
        WHERE entity_type = $1 AND record_key = $2 AND version = $3
        "#,
    )
    .bind(entity_type.as_str())
    .bind(key.to_string())
    .bind(version_param(expected_version)?)
    .execute(&mut **transaction)
    .await
    .map_err(|error| write_error(error, "delete", entity_type, key))?;

    if deleted.rows_affected() == 1 {
        return Ok(());
    }
    Err(version_mismatch(transaction, entity_type, key, expected_version).await)
}

pub(super) async fn adjust_counter(
    transaction: &mut Transaction<'_, Postgres>,
    entity_type: EntityType,
    key: &RecordKey,
    field: &'static str,
    delta: i64,
    bounds: CounterBounds,
) -> AppResult<Record> {
    let current = locked(transaction, entity_type, key, "FOR UPDATE")
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("{} '{key}' does not exist", entity_type.as_str()))
        })?;
    let data = adjusted_counter(&current, field, delta, bounds)?;

    replace(transaction, entity_type, key, data, current.version()).await
}

/// Locks the row and checks it exists, and optionally that its version
/// matches.
pub(super) async fn expect(
    transaction: &mut Transaction<'_, Postgres>,
    entity_type: EntityType,
    key: &RecordKey,
    version: Option<u64>,
) -> AppResult<()> {
    let current = locked(transaction, entity_type, key, "FOR SHARE")
        .await?
        .ok_or_else(|| {
            AppError::PreconditionFailed(format!(
                "{} '{key}' no longer exists",
                entity_type.as_str()
            ))
        })?;

    match version {
        Some(version) if current.version() != version => Err(AppError::PreconditionFailed(
            format!("{} '{key}' changed concurrently", entity_type.as_str()),
        )),
        _ => Ok(()),
    }
}

async fn locked(
    transaction: &mut Transaction<'_, Postgres>,
    entity_type: EntityType,
    key: &RecordKey,
    lock: &str,
) -> AppResult<Option<Record>> {
    let statement = format!(
        "SELECT entity_type, record_key, data, version FROM records \
         WHERE entity_type = $1 AND record_key = $2 {lock}"
    );
    let row = sqlx::query_as::<_, RecordRow>(statement.as_str())
        .bind(entity_type.as_str())
        .bind(key.to_string())
        .fetch_optional(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to lock {} '{key}': {error}",
                entity_type.as_str()
            ))
        })?;

    row.map(record_from_row).transpose()
}

async fn version_mismatch(
    transaction: &mut Transaction<'_, Postgres>,
    entity_type: EntityType,
    key: &RecordKey,
    expected_version: u64,
) -> AppError {
    match locked(transaction, entity_type, key, "").await {
        Ok(Some(current)) => AppError::PreconditionFailed(format!(
            "{} '{key}' is at version {}, expected {expected_version}",
            entity_type.as_str(),
            current.version()
        )),
        Ok(None) => {
            AppError::NotFound(format!("{} '{key}' does not exist", entity_type.as_str()))
        }
        Err(error) => error,
    }
}

fn write_error(
    error: sqlx::Error,
    action: &str,
    entity_type: EntityType,
    key: &RecordKey,
) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        let constraint = database_error.constraint().unwrap_or("records_pkey");
        return AppError::AlreadyExists(format!(
            "{} '{key}' conflicts with an existing record on '{constraint}'",
            entity_type.as_str()
        ));
    }

    AppError::Internal(format!(
        "failed to {action} {} '{key}': {error}",
        entity_type.as_str()
    ))
}

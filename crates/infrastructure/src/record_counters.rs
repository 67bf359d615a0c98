//! Bounded counter arithmetic shared by the record stores.

use enermina_core::{AppError, AppResult};
use enermina_domain::Record;
use serde_json::{Map, Value};

/// Bounds of a counter adjustment.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CounterBounds {
    pub(crate) floor: Option<i64>,
    pub(crate) ceiling_field: Option<&'static str>,
}

/// Returns the record fields with `field` moved by `delta`.
///
/// Fails with `PreconditionFailed` when the result leaves the bounds. A
/// missing or null counter counts as zero.
pub(crate) fn adjusted_counter(
    record: &Record,
    field: &str,
    delta: i64,
    bounds: CounterBounds,
) -> AppResult<Map<String, Value>> {
    let next = counter_value(record, field)?.saturating_add(delta);

    if let Some(floor) = bounds.floor
        && next < floor
    {
        return Err(AppError::PreconditionFailed(format!(
            "{} field '{field}' cannot drop below {floor}",
            record_label(record)
        )));
    }
    if let Some(ceiling_field) = bounds.ceiling_field {
        let ceiling = counter_value(record, ceiling_field)?;
        if next > ceiling {
            return Err(AppError::PreconditionFailed(format!(
                "{} field '{field}' cannot exceed '{ceiling_field}' ({ceiling})",
                record_label(record)
            )));
        }
    }

    let mut data = record.data().clone();
    data.insert(field.to_owned(), Value::from(next));
    Ok(data)
}

pub(crate) fn record_label(record: &Record) -> String {
    format!("{} '{}'", record.entity_type().as_str(), record.key())
}

fn counter_value(record: &Record, field: &str) -> AppResult<i64> {
    match record.data().get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value.as_i64().ok_or_else(|| {
            AppError::Validation(format!(
                "{} field '{field}' is not an integer counter",
                record_label(record)
            ))
        }),
    }
}

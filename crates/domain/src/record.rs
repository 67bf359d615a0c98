use std::fmt::{Display, Formatter};
use std::str::FromStr;

use enermina_core::{AppError, AppResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::EntityType;

const KEY_SEPARATOR: char = ',';

/// Identifier of a record within its entity type.
///
/// Single-field identifiers hold one part; composite identifiers hold one
/// part per identifier field, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey(Vec<String>);

impl RecordKey {
    /// Creates a single-field key.
    #[must_use]
    pub fn single(value: impl Into<String>) -> Self {
        Self(vec![value.into()])
    }

    /// Creates a key from identifier parts.
    pub fn from_parts(parts: Vec<String>) -> AppResult<Self> {
        if parts.is_empty() {
            return Err(AppError::Validation(
                "record key must have at least one part".to_owned(),
            ));
        }

        if parts
            .iter()
            .any(|part| part.trim().is_empty() || part.contains(KEY_SEPARATOR))
        {
            return Err(AppError::Validation(format!(
                "record key parts must be non-empty and must not contain '{KEY_SEPARATOR}'"
            )));
        }

        Ok(Self(parts))
    }

    /// Returns the identifier parts.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        self.0.as_slice()
    }

    /// Returns the only part of a single-field key.
    #[must_use]
    pub fn as_single(&self) -> Option<&str> {
        match self.0.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

impl Display for RecordKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0.join(&KEY_SEPARATOR.to_string()))
    }
}

impl FromStr for RecordKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_parts(value.split(KEY_SEPARATOR).map(str::to_owned).collect())
    }
}

/// Stored record of any entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    entity_type: EntityType,
    key: RecordKey,
    data: Map<String, Value>,
    version: u64,
}

impl Record {
    /// Creates a record projection.
    #[must_use]
    pub fn new(
        entity_type: EntityType,
        key: RecordKey,
        data: Map<String, Value>,
        version: u64,
    ) -> Self {
        Self {
            entity_type,
            key,
            data,
            version,
        }
    }

    /// Returns the entity type.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Returns the record fields.
    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Consumes the record and returns its fields.
    #[must_use]
    pub fn into_data(self) -> Map<String, Value> {
        self.data
    }

    /// Returns the optimistic concurrency version. New records start at 1.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns a copy with replaced fields and the given version.
    #[must_use]
    pub fn with_data(&self, data: Map<String, Value>, version: u64) -> Self {
        Self {
            entity_type: self.entity_type,
            key: self.key.clone(),
            data,
            version,
        }
    }

    /// Returns a string field.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    /// Returns an integer field.
    #[must_use]
    pub fn integer(&self, field: &str) -> Option<i64> {
        self.data.get(field).and_then(Value::as_i64)
    }

    /// Returns a boolean field, treating absence as false.
    #[must_use]
    pub fn flag(&self, field: &str) -> bool {
        self.data
            .get(field)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns a numeric field as an exact decimal.
    pub fn decimal(&self, field: &str) -> AppResult<Option<Decimal>> {
        decimal_field(&self.data, field)
    }

    /// Parses a tag field into its registry enum.
    pub fn tag<T>(&self, field: &str) -> AppResult<Option<T>>
    where
        T: FromStr<Err = AppError>,
    {
        self.text(field).map(T::from_str).transpose()
    }
}

/// Reads a JSON number field as an exact decimal.
///
/// Numbers are parsed from their shortest textual form so that `0.1` stays
/// `0.1` instead of its binary approximation.
pub fn decimal_field(data: &Map<String, Value>, field: &str) -> AppResult<Option<Decimal>> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => {
            let text = number.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map(Some)
                .map_err(|_| {
                    AppError::Validation(format!("field '{field}' is not a representable amount"))
                })
        }
        Some(_) => Err(AppError::Validation(format!(
            "field '{field}' must be a number"
        ))),
    }
}

/// Returns the secondary index value of a scalar JSON value.
///
/// Arrays, objects and nulls are not indexable.
#[must_use]
pub fn index_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

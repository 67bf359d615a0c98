use chrono::{DateTime, NaiveDate};
use enermina_core::{AppError, AppResult};
use serde_json::{Map, Value};

/// Value shape of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Non-empty identifier string.
    Id,
    /// UTF-8 string.
    Text,
    /// Whole number.
    Integer,
    /// Any JSON number, handled as a decimal amount where money is involved.
    Float,
    /// Boolean.
    Boolean,
    /// `YYYY-MM-DD` date string.
    Date,
    /// RFC 3339 date-time string.
    DateTime,
    /// Arbitrary JSON.
    Json,
    /// Array of strings.
    TextList,
    /// Array of arbitrary JSON values.
    JsonList,
    /// String restricted to a registry tag set.
    Tag(&'static [&'static str]),
    /// Nested object with its own field list.
    Object(Vec<FieldSpec>),
}

impl FieldKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Json => "json",
            Self::TextList => "text list",
            Self::JsonList => "json list",
            Self::Tag(_) => "tag",
            Self::Object(_) => "object",
        }
    }
}

/// Declared field of an entity or nested object.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
    required: bool,
    default: Option<Value>,
    immutable: bool,
    managed: bool,
}

impl FieldSpec {
    /// Creates an optional field of the given kind.
    #[must_use]
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            immutable: false,
            managed: false,
        }
    }

    /// Identifier field.
    #[must_use]
    pub fn id(name: &'static str) -> Self {
        Self::new(name, FieldKind::Id)
    }

    /// Text field.
    #[must_use]
    pub fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// Integer field.
    #[must_use]
    pub fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    /// Numeric field.
    #[must_use]
    pub fn float(name: &'static str) -> Self {
        Self::new(name, FieldKind::Float)
    }

    /// Boolean field.
    #[must_use]
    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// Date field.
    #[must_use]
    pub fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    /// Date-time field.
    #[must_use]
    pub fn datetime(name: &'static str) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    /// Free-form JSON field.
    #[must_use]
    pub fn json(name: &'static str) -> Self {
        Self::new(name, FieldKind::Json)
    }

    /// String array field.
    #[must_use]
    pub fn text_list(name: &'static str) -> Self {
        Self::new(name, FieldKind::TextList)
    }

    /// JSON array field.
    #[must_use]
    pub fn json_list(name: &'static str) -> Self {
        Self::new(name, FieldKind::JsonList)
    }

    /// Registry tag field.
    #[must_use]
    pub fn tag(name: &'static str, tags: &'static [&'static str]) -> Self {
        Self::new(name, FieldKind::Tag(tags))
    }

    /// Nested object field.
    #[must_use]
    pub fn object(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self::new(name, FieldKind::Object(fields))
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the value applied on create when the field is absent.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Forbids changes after creation.
    #[must_use]
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Reserves the field for lifecycle transitions and counter adjustments.
    ///
    /// Generic updates cannot change a managed field, and a create may only
    /// supply its declared default.
    #[must_use]
    pub fn managed(mut self) -> Self {
        self.managed = true;
        self
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the value shape.
    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Returns true when the field must be present and non-null.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the create default, if any.
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns true when the field cannot change after creation.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// Returns true when only lifecycle operations may change the field.
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.managed
    }

    /// Checks a present value against the field's shape.
    pub fn validate_value(&self, value: &Value) -> AppResult<()> {
        if value.is_null() {
            if self.required {
                return Err(AppError::Validation(format!(
                    "field '{}' is required",
                    self.name
                )));
            }
            return Ok(());
        }

        let is_valid = match &self.kind {
            FieldKind::Id => value.as_str().is_some_and(|text| !text.trim().is_empty()),
            FieldKind::Text => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Float => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Date => value
                .as_str()
                .is_some_and(|text| NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()),
            FieldKind::DateTime => value
                .as_str()
                .is_some_and(|text| DateTime::parse_from_rfc3339(text).is_ok()),
            FieldKind::Json => true,
            FieldKind::TextList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            FieldKind::JsonList => value.is_array(),
            FieldKind::Tag(tags) => {
                let Some(text) = value.as_str() else {
                    return Err(AppError::Validation(format!(
                        "field '{}' must be one of {}",
                        self.name,
                        tags.join(", ")
                    )));
                };
                if !tags.contains(&text) {
                    return Err(AppError::Validation(format!(
                        "unknown value '{text}' for field '{}'; expected one of {}",
                        self.name,
                        tags.join(", ")
                    )));
                }
                true
            }
            FieldKind::Object(fields) => {
                let Some(object) = value.as_object() else {
                    return Err(AppError::Validation(format!(
                        "field '{}' must be an object",
                        self.name
                    )));
                };
                validate_object(fields, object)
                    .map_err(|error| nest_error(self.name, error))?;
                true
            }
        };

        if !is_valid {
            return Err(AppError::Validation(format!(
                "field '{}' does not match type '{}'",
                self.name,
                self.kind.label()
            )));
        }

        Ok(())
    }
}

/// Validates a complete object against a field list.
///
/// Unknown keys are rejected and every required field must be present.
pub fn validate_object(fields: &[FieldSpec], object: &Map<String, Value>) -> AppResult<()> {
    if let Some(unknown) = object
        .keys()
        .find(|key| !fields.iter().any(|field| field.name() == key.as_str()))
    {
        return Err(AppError::Validation(format!("unknown field '{unknown}'")));
    }

    for field in fields {
        match object.get(field.name()) {
            Some(value) => field.validate_value(value)?,
            None if field.is_required() => {
                return Err(AppError::Validation(format!(
                    "field '{}' is required",
                    field.name()
                )));
            }
            None => {}
        }
    }

    Ok(())
}

fn nest_error(parent: &str, error: AppError) -> AppError {
    match error {
        AppError::Validation(message) => AppError::Validation(format!("{parent}: {message}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FieldSpec, validate_object};
    use crate::InvoiceStatus;

    #[test]
    fn tag_fields_reject_unknown_values() {
        let field = FieldSpec::tag("status", InvoiceStatus::TAGS);
        assert!(field.validate_value(&json!("PAID")).is_ok());
        assert!(field.validate_value(&json!("SETTLED")).is_err());
        assert!(field.validate_value(&json!(3)).is_err());
    }

    #[test]
    fn dates_and_datetimes_are_parsed() {
        assert!(FieldSpec::date("date").validate_value(&json!("2025-02-30")).is_err());
        assert!(FieldSpec::date("date").validate_value(&json!("2025-02-28")).is_ok());
        assert!(
            FieldSpec::datetime("at")
                .validate_value(&json!("2025-02-28T10:00:00Z"))
                .is_ok()
        );
        assert!(FieldSpec::datetime("at").validate_value(&json!("yesterday")).is_err());
    }

    #[test]
    fn nested_objects_validate_their_own_fields() {
        let field = FieldSpec::object(
            "timeRange",
            vec![
                FieldSpec::text("openingTime").required(),
                FieldSpec::text("closingTime").required(),
            ],
        );

        assert!(
            field
                .validate_value(&json!({ "openingTime": "08:00", "closingTime": "17:00" }))
                .is_ok()
        );
        assert!(field.validate_value(&json!({ "openingTime": "08:00" })).is_err());
        assert!(
            field
                .validate_value(&json!({ "openingTime": "08:00", "closingTime": "17:00", "x": 1 }))
                .is_err()
        );
    }

    #[test]
    fn required_null_is_rejected() {
        let fields = vec![FieldSpec::text("title").required()];
        let object = json!({ "title": null });
        let object = object.as_object().cloned().unwrap_or_default();
        assert!(validate_object(&fields, &object).is_err());
    }
}

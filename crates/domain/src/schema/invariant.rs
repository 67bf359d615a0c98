use std::str::FromStr;

use chrono::NaiveTime;
use enermina_core::{AppError, AppResult};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::record::decimal_field;
use crate::{NotificationTemplateKey, PaymentMethodType};

/// Structural rule over the fields of a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invariant {
    /// Exactly one of the nullable fields is set.
    ExactlyOneOf(&'static [&'static str]),
    /// At most one of the nullable fields is set.
    AtMostOneOf(&'static [&'static str]),
    /// Integer field lies within inclusive bounds when present.
    IntegerRange {
        /// Checked field.
        field: &'static str,
        /// Inclusive lower bound.
        min: Option<i64>,
        /// Inclusive upper bound.
        max: Option<i64>,
    },
    /// Integer field never exceeds another integer field.
    NotGreaterThan {
        /// Bounded field.
        field: &'static str,
        /// Bounding field.
        limit: &'static str,
    },
    /// Numeric field is zero or positive when present.
    NonNegative(&'static str),
    /// `total = subTotal - discount + taxes`, compared at cent precision.
    AmountBalance {
        /// Total field.
        total: &'static str,
        /// Subtotal field.
        sub_total: &'static str,
        /// Discount field.
        discount: &'static str,
        /// Taxes field.
        taxes: &'static str,
    },
    /// Card details for card methods, mobile details for mobile methods.
    PaymentDetails {
        /// Method type field.
        kind: &'static str,
        /// Card details field.
        card: &'static str,
        /// Mobile details field.
        mobile: &'static str,
    },
    /// Field must be set when the boolean flag is true.
    RequiredWhen {
        /// Conditionally required field.
        field: &'static str,
        /// Boolean flag.
        flag: &'static str,
    },
    /// `HH:MM` opening time before closing time, unless a flag waives it.
    OpeningTimeRange {
        /// Object field holding `openingTime` and `closingTime`.
        field: &'static str,
        /// Flags that waive the range.
        waived_by: &'static [&'static str],
    },
    /// Template data carries every key the template interpolates.
    TemplateData {
        /// Template key field.
        key: &'static str,
        /// Template data field.
        data: &'static str,
    },
    /// Channel list of `{ type, targets[] }` entries.
    DeliveryChannels(&'static str),
}

impl Invariant {
    /// Checks the invariant against a full record payload.
    pub fn check(&self, data: &Map<String, Value>) -> AppResult<()> {
        match self {
            Self::ExactlyOneOf(fields) => {
                let set = count_set(data, fields);
                if set != 1 {
                    return Err(AppError::Validation(format!(
                        "exactly one of {} must be set, found {set}",
                        fields.join(", ")
                    )));
                }
            }
            Self::AtMostOneOf(fields) => {
                let set = count_set(data, fields);
                if set > 1 {
                    return Err(AppError::Validation(format!(
                        "at most one of {} may be set",
                        fields.join(", ")
                    )));
                }
            }
            Self::IntegerRange { field, min, max } => {
                if let Some(value) = data.get(*field).and_then(Value::as_i64) {
                    let below = min.is_some_and(|min| value < min);
                    let above = max.is_some_and(|max| value > max);
                    if below || above {
                        return Err(AppError::Validation(format!(
                            "field '{field}' is out of range: {value}"
                        )));
                    }
                }
            }
            Self::NotGreaterThan { field, limit } => {
                let value = data.get(*field).and_then(Value::as_i64);
                let bound = data.get(*limit).and_then(Value::as_i64);
                if let (Some(value), Some(bound)) = (value, bound)
                    && value > bound
                {
                    return Err(AppError::Validation(format!(
                        "field '{field}' ({value}) must not exceed '{limit}' ({bound})"
                    )));
                }
            }
            Self::NonNegative(field) => {
                if let Some(value) = decimal_field(data, field)?
                    && value.is_sign_negative()
                    && !value.is_zero()
                {
                    return Err(AppError::Validation(format!(
                        "field '{field}' must not be negative"
                    )));
                }
            }
            Self::AmountBalance {
                total,
                sub_total,
                discount,
                taxes,
            } => {
                let expected = amount(data, sub_total)? - amount(data, discount)?
                    + amount(data, taxes)?;
                let actual = amount(data, total)?;
                if expected.round_dp(2) != actual.round_dp(2) {
                    return Err(AppError::Validation(format!(
                        "'{total}' must equal '{sub_total}' - '{discount}' + '{taxes}' ({}), got {}",
                        expected.round_dp(2),
                        actual
                    )));
                }
            }
            Self::PaymentDetails { kind, card, mobile } => {
                let Some(kind_value) = data.get(*kind).and_then(Value::as_str) else {
                    return Err(AppError::Validation(format!("field '{kind}' is required")));
                };
                let method = PaymentMethodType::from_str(kind_value)?;
                let has_card = is_set(data, card);
                let has_mobile = is_set(data, mobile);
                let valid = if method.is_card() {
                    has_card && !has_mobile
                } else {
                    has_mobile && !has_card
                };
                if !valid {
                    let expected = if method.is_card() { card } else { mobile };
                    return Err(AppError::Validation(format!(
                        "payment method of type {method} must carry only '{expected}'"
                    )));
                }
            }
            Self::RequiredWhen { field, flag } => {
                let flagged = data.get(*flag).and_then(Value::as_bool).unwrap_or(false);
                if flagged && !is_set(data, field) {
                    return Err(AppError::Validation(format!(
                        "field '{field}' is required when '{flag}' is true"
                    )));
                }
            }
            Self::OpeningTimeRange { field, waived_by } => {
                let waived = waived_by
                    .iter()
                    .any(|flag| data.get(*flag).and_then(Value::as_bool).unwrap_or(false));
                if !waived {
                    check_time_range(field, data.get(*field))?;
                }
            }
            Self::TemplateData { key, data: field } => {
                if let Some(template) = data.get(*key).and_then(Value::as_str) {
                    let template = NotificationTemplateKey::from_str(template)?;
                    let Some(values) = data.get(*field).and_then(Value::as_object) else {
                        return Err(AppError::Validation(format!(
                            "field '{field}' must be an object for template {template}"
                        )));
                    };
                    if let Some(missing) = template
                        .required_data_keys()
                        .iter()
                        .find(|required| !values.contains_key(**required))
                    {
                        return Err(AppError::Validation(format!(
                            "template {template} requires '{field}.{missing}'"
                        )));
                    }
                }
            }
            Self::DeliveryChannels(field) => check_channels(field, data.get(*field))?,
        }

        Ok(())
    }
}

fn is_set(data: &Map<String, Value>, field: &str) -> bool {
    data.get(field).is_some_and(|value| !value.is_null())
}

fn count_set(data: &Map<String, Value>, fields: &[&str]) -> usize {
    fields.iter().filter(|field| is_set(data, field)).count()
}

fn amount(data: &Map<String, Value>, field: &str) -> AppResult<Decimal> {
    decimal_field(data, field)?
        .ok_or_else(|| AppError::Validation(format!("field '{field}' is required")))
}

fn check_time_range(field: &str, value: Option<&Value>) -> AppResult<()> {
    let Some(range) = value.and_then(Value::as_object) else {
        return Err(AppError::Validation(format!(
            "field '{field}' is required unless the day is closed or open all day"
        )));
    };

    let parse = |name: &str| -> AppResult<NaiveTime> {
        range
            .get(name)
            .and_then(Value::as_str)
            .and_then(|text| NaiveTime::parse_from_str(text, "%H:%M").ok())
            .ok_or_else(|| AppError::Validation(format!("'{field}.{name}' must be HH:MM")))
    };

    let opening = parse("openingTime")?;
    let closing = parse("closingTime")?;
    if opening >= closing {
        return Err(AppError::Validation(format!(
            "'{field}.openingTime' must be before '{field}.closingTime'"
        )));
    }

    Ok(())
}

fn check_channels(field: &str, value: Option<&Value>) -> AppResult<()> {
    let Some(channels) = value.and_then(Value::as_array) else {
        return Err(AppError::Validation(format!(
            "field '{field}' must be an array of channels"
        )));
    };

    for channel in channels {
        let valid = channel.as_object().is_some_and(|entry| {
            let has_type = entry
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|kind| !kind.trim().is_empty());
            let has_targets = entry
                .get("targets")
                .and_then(Value::as_array)
                .is_some_and(|targets| targets.iter().all(Value::is_string));
            has_type && has_targets && entry.len() == 2
        });
        if !valid {
            return Err(AppError::Validation(format!(
                "every entry of '{field}' must be {{ type: string, targets: string[] }}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::Invariant;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    const INVOICE_BALANCE: Invariant = Invariant::AmountBalance {
        total: "totalAmount",
        sub_total: "subTotal",
        discount: "discount",
        taxes: "taxes",
    };

    #[test]
    fn exactly_one_of_rejects_none_and_both() {
        let invariant = Invariant::ExactlyOneOf(&["articleId", "contentBlockId"]);
        assert!(invariant.check(&object(json!({ "articleId": "a" }))).is_ok());
        assert!(invariant.check(&object(json!({}))).is_err());
        assert!(
            invariant
                .check(&object(json!({ "articleId": "a", "contentBlockId": "b" })))
                .is_err()
        );
        assert!(
            invariant
                .check(&object(json!({ "articleId": "a", "contentBlockId": null })))
                .is_ok()
        );
    }

    #[test]
    fn invoice_balance_is_exact_to_the_cent() {
        let balanced = object(json!({
            "subTotal": 100.10, "discount": 0.1, "taxes": 16.0, "totalAmount": 116.0
        }));
        assert!(INVOICE_BALANCE.check(&balanced).is_ok());

        let unbalanced = object(json!({
            "subTotal": 100, "discount": 0, "taxes": 16, "totalAmount": 115.99
        }));
        assert!(INVOICE_BALANCE.check(&unbalanced).is_err());
    }

    #[test]
    fn payment_details_follow_method_type() {
        let invariant = Invariant::PaymentDetails {
            kind: "type",
            card: "cardDetails",
            mobile: "mobileDetails",
        };
        assert!(
            invariant
                .check(&object(json!({ "type": "VISA_CARD" })))
                .is_err()
        );
        assert!(
            invariant
                .check(&object(json!({ "type": "CREDIT_CARD", "cardDetails": { "lastFourDigits": "4242" } })))
                .is_ok()
        );
        assert!(
            invariant
                .check(&object(json!({
                    "type": "MOBILE_PAYMENT",
                    "cardDetails": { "lastFourDigits": "4242" },
                    "mobileDetails": { "mobileNumber": "840000000" }
                })))
                .is_err()
        );
    }

    #[test]
    fn opening_hours_need_an_ordered_range_unless_waived() {
        let invariant = Invariant::OpeningTimeRange {
            field: "timeRange",
            waived_by: &["isClosed", "is24Hours"],
        };
        assert!(invariant.check(&object(json!({ "isClosed": true }))).is_ok());
        assert!(
            invariant
                .check(&object(json!({ "timeRange": { "openingTime": "18:00", "closingTime": "09:00" } })))
                .is_err()
        );
        assert!(
            invariant
                .check(&object(json!({ "timeRange": { "openingTime": "09:00", "closingTime": "18:00" } })))
                .is_ok()
        );
    }

    #[test]
    fn template_data_must_cover_template_keys() {
        let invariant = Invariant::TemplateData {
            key: "templateKey",
            data: "templateData",
        };
        assert!(
            invariant
                .check(&object(json!({ "templateKey": "USER_WELCOME", "templateData": {} })))
                .is_err()
        );
        assert!(
            invariant
                .check(&object(json!({
                    "templateKey": "USER_WELCOME",
                    "templateData": { "firstName": "Ana" }
                })))
                .is_ok()
        );
    }

    #[test]
    fn channels_have_type_and_string_targets() {
        let invariant = Invariant::DeliveryChannels("channels");
        assert!(
            invariant
                .check(&object(json!({ "channels": [{ "type": "EMAIL", "targets": ["a@b.c"] }] })))
                .is_ok()
        );
        assert!(
            invariant
                .check(&object(json!({ "channels": [{ "type": "EMAIL", "targets": [1] }] })))
                .is_err()
        );
    }
}

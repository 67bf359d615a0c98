use enermina_core::{AppError, AppResult};
use serde_json::{Map, Value};

use crate::EntityType;

/// Declared link between two entity types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relationship {
    /// This record's foreign key points at the target's identifier.
    BelongsTo {
        /// Relationship name.
        name: &'static str,
        /// Foreign key field on this record.
        field: &'static str,
        /// Referenced type.
        target: EntityType,
    },
    /// Target records whose foreign key equals this record's identifier.
    HasMany {
        /// Relationship name.
        name: &'static str,
        /// Related type.
        target: EntityType,
        /// Foreign key field on the related type.
        foreign_key: &'static str,
        /// Tag the related record must carry when its foreign key is polymorphic.
        tag: Option<TagFilter>,
    },
    /// Same as [`Relationship::HasMany`] with at most one related record.
    HasOne {
        /// Relationship name.
        name: &'static str,
        /// Related type.
        target: EntityType,
        /// Foreign key field on the related type.
        foreign_key: &'static str,
        /// Tag the related record must carry when its foreign key is polymorphic.
        tag: Option<TagFilter>,
    },
    /// `(type tag, id)` pair resolved through a dispatch table.
    Polymorphic {
        /// Relationship name.
        name: &'static str,
        /// Tag field on this record.
        tag_field: &'static str,
        /// Identifier field on this record.
        id_field: &'static str,
        /// Tag to target type dispatch table.
        targets: &'static [(&'static str, EntityType)],
    },
}

/// Tag constraint on the related side of a polymorphic foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagFilter {
    /// Tag field on the related record.
    pub field: &'static str,
    /// Required tag value.
    pub value: &'static str,
}

impl Relationship {
    /// Returns the relationship name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BelongsTo { name, .. }
            | Self::HasMany { name, .. }
            | Self::HasOne { name, .. }
            | Self::Polymorphic { name, .. } => *name,
        }
    }

    /// Returns the foreign key field this record carries, if any.
    #[must_use]
    pub fn local_foreign_key(&self) -> Option<&'static str> {
        match self {
            Self::BelongsTo { field, .. } => Some(*field),
            Self::Polymorphic { id_field, .. } => Some(*id_field),
            Self::HasMany { .. } | Self::HasOne { .. } => None,
        }
    }
}

/// Outgoing reference read from a record payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Relationship the reference belongs to.
    pub relationship: &'static str,
    /// Foreign key field holding the identifier.
    pub field: &'static str,
    /// Referenced type.
    pub target: EntityType,
    /// Referenced identifier.
    pub id: String,
}

/// Lists the outgoing references of a payload.
///
/// Null foreign keys produce no reference; whether they may be null is a
/// schema concern. Polymorphic tags are dispatched through the declared
/// table and an undeclared tag is a schema violation.
pub fn outgoing_references(
    relationships: &[Relationship],
    data: &Map<String, Value>,
) -> AppResult<Vec<Reference>> {
    let mut references = Vec::new();
    for relationship in relationships {
        match relationship {
            Relationship::BelongsTo {
                name,
                field,
                target,
            } => {
                if let Some(id) = data.get(*field).and_then(Value::as_str) {
                    references.push(Reference {
                        relationship: *name,
                        field: *field,
                        target: *target,
                        id: id.to_owned(),
                    });
                }
            }
            Relationship::Polymorphic {
                name,
                tag_field,
                id_field,
                targets,
            } => {
                let Some(id) = data.get(*id_field).and_then(Value::as_str) else {
                    continue;
                };
                let tag = data.get(*tag_field).and_then(Value::as_str).ok_or_else(|| {
                    AppError::SchemaViolation(format!(
                        "'{id_field}' requires '{tag_field}' to select its target type"
                    ))
                })?;
                let target = dispatch(targets, tag).ok_or_else(|| {
                    AppError::SchemaViolation(format!(
                        "'{tag}' is not a valid '{tag_field}' for relationship '{name}'"
                    ))
                })?;
                references.push(Reference {
                    relationship: *name,
                    field: *id_field,
                    target,
                    id: id.to_owned(),
                });
            }
            Relationship::HasMany { .. } | Relationship::HasOne { .. } => {}
        }
    }

    Ok(references)
}

/// Resolves a type tag through a dispatch table.
#[must_use]
pub fn dispatch(targets: &[(&'static str, EntityType)], tag: &str) -> Option<EntityType> {
    targets
        .iter()
        .find(|(candidate, _)| *candidate == tag)
        .map(|(_, target)| *target)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Relationship, outgoing_references};
    use crate::EntityType;

    const INVOICE_SOURCES: &[(&str, EntityType)] = &[
        ("RESOURCE_ORDER", EntityType::ResourceOrder),
        ("EVENT_ORDER", EntityType::EventOrder),
    ];

    fn invoice_relationships() -> Vec<Relationship> {
        vec![
            Relationship::BelongsTo {
                name: "user",
                field: "ownerId",
                target: EntityType::User,
            },
            Relationship::Polymorphic {
                name: "source",
                tag_field: "invoiceSourceType",
                id_field: "invoiceSourceId",
                targets: INVOICE_SOURCES,
            },
        ]
    }

    #[test]
    fn polymorphic_reference_dispatches_on_tag() {
        let data = json!({
            "ownerId": "user-1",
            "invoiceSourceType": "EVENT_ORDER",
            "invoiceSourceId": "order-1"
        });
        let data = data.as_object().cloned().unwrap_or_default();
        let references =
            outgoing_references(&invoice_relationships(), &data).unwrap_or_else(|_| unreachable!());

        assert_eq!(references.len(), 2);
        assert_eq!(references[1].target, EntityType::EventOrder);
        assert_eq!(references[1].id, "order-1");
    }

    #[test]
    fn unknown_tag_is_schema_violation() {
        let data = json!({ "invoiceSourceType": "SUBSCRIPTION", "invoiceSourceId": "order-1" });
        let data = data.as_object().cloned().unwrap_or_default();
        let result = outgoing_references(&invoice_relationships(), &data);

        assert!(matches!(
            result,
            Err(enermina_core::AppError::SchemaViolation(_))
        ));
    }
}

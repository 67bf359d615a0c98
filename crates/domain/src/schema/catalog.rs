mod business;
mod commerce;
mod content;
mod engagement;
mod events;
mod people;

use std::collections::HashMap;

use enermina_core::{AppError, AppResult};

use super::{EntitySchema, IndexSpec};
use crate::policy::{Operation, SubjectMatcher};
use crate::relationship::Relationship;
use crate::{EntityType, UserRole};

const CRUD: &[Operation] = &[
    Operation::Create,
    Operation::Read,
    Operation::Update,
    Operation::Delete,
];
const CREATE_READ_UPDATE: &[Operation] = &[Operation::Create, Operation::Read, Operation::Update];
const READ: &[Operation] = &[Operation::Read];
const READ_UPDATE: &[Operation] = &[Operation::Read, Operation::Update];

fn admins() -> SubjectMatcher {
    SubjectMatcher::Groups(vec![UserRole::Admin])
}

fn admins_and_professionals() -> SubjectMatcher {
    SubjectMatcher::Groups(vec![UserRole::Admin, UserRole::Professional])
}

/// Registry of every entity schema, keyed by entity type.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    schemas: HashMap<EntityType, EntitySchema>,
}

impl SchemaCatalog {
    /// Builds the platform catalog.
    #[must_use]
    pub fn standard() -> Self {
        let mut schemas = Vec::new();
        schemas.extend(people::schemas());
        schemas.extend(content::schemas());
        schemas.extend(business::schemas());
        schemas.extend(events::schemas());
        schemas.extend(engagement::schemas());
        schemas.extend(commerce::schemas());
        Self::from_schemas(schemas)
    }

    /// Builds a catalog from explicit schemas.
    #[must_use]
    pub fn from_schemas(schemas: Vec<EntitySchema>) -> Self {
        Self {
            schemas: schemas
                .into_iter()
                .map(|schema| (schema.entity_type(), schema))
                .collect(),
        }
    }

    /// Returns the schema of an entity type.
    pub fn schema(&self, entity_type: EntityType) -> AppResult<&EntitySchema> {
        self.schemas.get(&entity_type).ok_or_else(|| {
            AppError::SchemaViolation(format!(
                "entity type '{}' has no schema",
                entity_type.as_str()
            ))
        })
    }

    /// Returns every schema, in no particular order.
    pub fn schemas(&self) -> impl Iterator<Item = &EntitySchema> {
        self.schemas.values()
    }

    /// Returns the secondary indexes the record store must maintain.
    ///
    /// Covers declared unique indexes, owner fields, every foreign key and the
    /// foreign keys reverse relationships look up.
    #[must_use]
    pub fn index_plan(&self) -> Vec<IndexSpec> {
        let mut plan: Vec<IndexSpec> = Vec::new();
        let mut push = |index: IndexSpec| {
            if !plan.contains(&index) {
                plan.push(index);
            }
        };

        let mut ordered: Vec<&EntitySchema> = self.schemas.values().collect();
        ordered.sort_by_key(|schema| schema.entity_type());

        for schema in ordered {
            let entity_type = schema.entity_type();
            for index in schema.indexes() {
                push(index.clone());
            }
            if let Some(owner) = schema.owner().field_name() {
                push(IndexSpec::lookup(entity_type, owner));
            }
            for relationship in schema.relationships() {
                match relationship {
                    Relationship::BelongsTo { field, .. } => {
                        push(IndexSpec::lookup(entity_type, *field));
                    }
                    Relationship::Polymorphic { id_field, .. } => {
                        push(IndexSpec::lookup(entity_type, *id_field));
                    }
                    Relationship::HasMany {
                        target,
                        foreign_key,
                        ..
                    }
                    | Relationship::HasOne {
                        target,
                        foreign_key,
                        ..
                    } => push(IndexSpec::lookup(*target, *foreign_key)),
                }
            }
        }

        plan
    }
}

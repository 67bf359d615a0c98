use super::*;

impl RecordService {
    /// Loads every record a payload references.
    ///
    /// A non-null foreign key that resolves to nothing is a dangling
    /// reference; an undeclared polymorphic tag is a schema violation.
    pub(super) async fn resolve_references(
        &self,
        schema: &EntitySchema,
        data: &Map<String, Value>,
    ) -> AppResult<Vec<(Reference, Record)>> {
        let references = outgoing_references(schema.relationships(), data)?;
        let mut resolved = Vec::with_capacity(references.len());

        for reference in references {
            let key = RecordKey::single(reference.id.clone());
            let Some(record) = self.store.find(reference.target, &key).await? else {
                return Err(AppError::DanglingReference(format!(
                    "'{}' of '{}' points at missing {} '{}'",
                    reference.field,
                    schema.entity_type().as_str(),
                    reference.target.as_str(),
                    reference.id
                )));
            };
            resolved.push((reference, record));
        }

        Ok(resolved)
    }
}

/// Guard keeping a referenced record alive until the batch commits.
pub(super) fn exists_guard(record: &Record) -> RecordWrite {
    RecordWrite::Exists {
        entity_type: record.entity_type(),
        key: record.key().clone(),
    }
}

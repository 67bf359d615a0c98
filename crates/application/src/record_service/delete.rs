use super::*;

impl RecordService {
    /// Deletes a record and returns its last state.
    ///
    /// Soft-deletable entities are marked `isDeleted` and stay resolvable;
    /// others are removed. Children are never cascaded. Removing a like
    /// gives its item's counter back, never below zero.
    pub async fn delete_record(
        &self,
        subject: &Subject,
        entity_type: EntityType,
        key: &RecordKey,
    ) -> AppResult<Record> {
        let schema = self.authorization_service.schema(entity_type)?;
        schema.validate_key(key)?;
        self.authorization_service
            .ensure_enabled(entity_type, Operation::Delete)?;

        let existing = self.require_record(entity_type, key).await?;
        self.authorization_service
            .require_on_record(subject, Operation::Delete, &existing)?;

        let mut batch = WriteBatch::new();
        if entity_type == EntityType::Like {
            batch.extend(self.unlike_counter(schema, &existing).await?);
        }

        if schema.is_soft_deletable() {
            let mut data = existing.data().clone();
            data.insert(SOFT_DELETE_FIELD.to_owned(), Value::Bool(true));
            batch.push(RecordWrite::replace(&existing, data));
            let mut written = self.store.commit(batch).await?;
            return written.pop().ok_or_else(|| {
                AppError::Internal("record store returned no written record".to_owned())
            });
        }

        batch.push(RecordWrite::Delete {
            entity_type,
            key: key.clone(),
            expected_version: existing.version(),
        });
        self.store.commit(batch).await?;
        Ok(existing)
    }

    async fn unlike_counter(
        &self,
        schema: &EntitySchema,
        like: &Record,
    ) -> AppResult<Option<RecordWrite>> {
        let references = outgoing_references(schema.relationships(), like.data())?;
        let Some(reference) = references
            .into_iter()
            .find(|reference| reference.relationship == "likedItem")
        else {
            return Ok(None);
        };
        let Some(field) = like_counter(reference.target) else {
            return Ok(None);
        };

        let key = RecordKey::single(reference.id);
        let Some(item) = self.store.find(reference.target, &key).await? else {
            return Ok(None);
        };
        if item.integer(field).unwrap_or(0) <= 0 {
            return Ok(None);
        }

        Ok(Some(RecordWrite::AdjustCounter {
            entity_type: reference.target,
            key,
            field,
            delta: -1,
            floor: Some(0),
            ceiling_field: None,
        }))
    }
}

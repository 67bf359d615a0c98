use super::*;

impl RecordService {
    /// Resolves a named relationship of a record.
    ///
    /// `belongsTo` and polymorphic references follow the local foreign key;
    /// `hasMany` and `hasOne` look up the related type's foreign key index.
    /// Related records the subject may not read are omitted.
    pub async fn related_records(
        &self,
        subject: &Subject,
        entity_type: EntityType,
        key: &RecordKey,
        relationship_name: &str,
    ) -> AppResult<Vec<Record>> {
        let schema = self.authorization_service.schema(entity_type)?;
        let relationship = schema.relationship(relationship_name).ok_or_else(|| {
            AppError::NotFound(format!(
                "'{}' declares no relationship '{relationship_name}'",
                entity_type.as_str()
            ))
        })?;
        let record = self.get_record(subject, entity_type, key).await?;

        let related = match relationship {
            Relationship::BelongsTo { .. } | Relationship::Polymorphic { .. } => {
                let references =
                    outgoing_references(std::slice::from_ref(relationship), record.data())?;
                let mut found = Vec::with_capacity(references.len());
                for reference in references {
                    if let Some(target) = self
                        .store
                        .find(reference.target, &RecordKey::single(reference.id))
                        .await?
                    {
                        found.push(target);
                    }
                }
                found
            }
            Relationship::HasMany {
                target,
                foreign_key,
                tag,
                ..
            }
            | Relationship::HasOne {
                target,
                foreign_key,
                tag,
                ..
            } => {
                let mut found = self
                    .store
                    .find_by_field(*target, foreign_key, &record.key().to_string())
                    .await?;
                if let Some(tag) = tag {
                    found.retain(|related| related.text(tag.field) == Some(tag.value));
                }
                found.sort_by(|left, right| left.key().cmp(right.key()));
                if matches!(relationship, Relationship::HasOne { .. }) {
                    found.truncate(1);
                }
                found
            }
        };

        Ok(related
            .into_iter()
            .filter(|related| self.authorization_service.can_read(subject, related))
            .collect())
    }
}

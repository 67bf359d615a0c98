use super::references::exists_guard;
use super::*;

impl RecordService {
    /// Creates a record.
    ///
    /// The implicit owner is stamped with the subject identity and a missing
    /// `id` is generated before the create rule is evaluated against the
    /// proposed owner.
    pub async fn create_record(
        &self,
        subject: &Subject,
        entity_type: EntityType,
        payload: Value,
    ) -> AppResult<Record> {
        let schema = self.authorization_service.schema(entity_type)?;
        let mut payload = payload_object(payload)?;

        if schema.owner() == OwnerField::Implicit
            && let Some(identity) = subject.identity_id()
        {
            payload
                .entry(enermina_domain::schema::IMPLICIT_OWNER_FIELD)
                .or_insert_with(|| Value::String(identity.to_owned()));
        }

        if schema.field("id").is_some() && payload.get("id").is_none_or(Value::is_null) {
            payload.insert("id".to_owned(), Value::String(Uuid::new_v4().to_string()));
        }

        self.authorization_service.require(
            subject,
            entity_type,
            Operation::Create,
            schema.proposed_owner(&payload),
        )?;

        let data = schema.normalize_create(payload)?;
        let key = schema.key_of(&data)?;
        let resolved = self.resolve_references(schema, &data).await?;

        let mut batch = WriteBatch::new();
        batch.push(RecordWrite::Insert {
            entity_type,
            key,
            data: data.clone(),
        });
        batch.extend(create_rules(entity_type, &data, &resolved)?);

        self.commit_one(batch).await
    }
}

/// Writes that make a create depend on the records it references.
fn create_rules(
    entity_type: EntityType,
    data: &Map<String, Value>,
    resolved: &[(Reference, Record)],
) -> AppResult<Vec<RecordWrite>> {
    let mut writes = Vec::with_capacity(resolved.len());
    for (reference, target) in resolved {
        match (entity_type, reference.relationship) {
            (EntityType::Invoice, "source") => {
                let invoice_owner = data.get("ownerId").and_then(Value::as_str);
                if target.text("ownerId") != invoice_owner {
                    return Err(AppError::Validation(format!(
                        "invoice owner must own its source {} '{}'",
                        target.entity_type().as_str(),
                        target.key()
                    )));
                }
                writes.push(RecordWrite::expect(target));
            }
            (EntityType::PaymentTransaction, "invoice") => {
                let status = target.tag::<InvoiceStatus>("status")?;
                if matches!(status, Some(InvoiceStatus::Paid | InvoiceStatus::Cancelled)) {
                    return Err(AppError::PreconditionFailed(format!(
                        "invoice '{}' no longer accepts payments",
                        target.key()
                    )));
                }
                writes.push(RecordWrite::expect(target));
            }
            (EntityType::Like, "likedItem") => match like_counter(target.entity_type()) {
                Some(field) => writes.push(RecordWrite::AdjustCounter {
                    entity_type: target.entity_type(),
                    key: target.key().clone(),
                    field,
                    delta: 1,
                    floor: Some(0),
                    ceiling_field: None,
                }),
                None => writes.push(exists_guard(target)),
            },
            _ => writes.push(exists_guard(target)),
        }
    }

    Ok(writes)
}

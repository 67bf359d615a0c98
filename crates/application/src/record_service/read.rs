use super::*;

impl RecordService {
    /// Returns a record the subject may read.
    ///
    /// Soft-deleted records stay resolvable by key.
    pub async fn get_record(
        &self,
        subject: &Subject,
        entity_type: EntityType,
        key: &RecordKey,
    ) -> AppResult<Record> {
        let schema = self.authorization_service.schema(entity_type)?;
        schema.validate_key(key)?;
        self.authorization_service
            .ensure_enabled(entity_type, Operation::Read)?;

        let record = self.require_record(entity_type, key).await?;
        self.authorization_service
            .require_on_record(subject, Operation::Read, &record)?;
        Ok(record)
    }

    /// Lists records of a type visible to the subject.
    ///
    /// Owner-only readers see their own records. Soft-deleted records and
    /// records whose listing parent is soft-deleted are left out; the page
    /// window applies to stored rows before that filter.
    pub async fn list_records(
        &self,
        subject: &Subject,
        entity_type: EntityType,
        query: RecordListQuery,
    ) -> AppResult<Vec<Record>> {
        let schema = self.authorization_service.schema(entity_type)?;
        let scope =
            self.authorization_service
                .listing_scope(subject, entity_type, Operation::Read)?;

        let records = match scope {
            ListingScope::Owned(identity) => {
                let Some(owner_field) = schema.owner().field_name() else {
                    return Ok(Vec::new());
                };
                let mut owned = self
                    .store
                    .find_by_field(entity_type, owner_field, &identity)
                    .await?;
                owned.sort_by(|left, right| left.key().cmp(right.key()));
                owned
                    .into_iter()
                    .skip(query.offset)
                    .take(query.limit)
                    .collect()
            }
            ListingScope::All => self.store.list(entity_type, query).await?,
            ListingScope::Denied(_) => return Ok(Vec::new()),
        };

        self.without_hidden(schema, records).await
    }

    /// Resolves which records of a type a live subscription may deliver.
    pub fn subscription_scope(
        &self,
        subject: &Subject,
        entity_type: EntityType,
    ) -> AppResult<ListingScope> {
        self.authorization_service
            .listing_scope(subject, entity_type, Operation::Subscribe)
    }

    /// Counts one download of a resource the subject may read.
    pub async fn record_download(&self, subject: &Subject, key: &RecordKey) -> AppResult<Record> {
        let resource = self.get_record(subject, EntityType::Resource, key).await?;

        let mut batch = WriteBatch::new();
        batch.push(RecordWrite::AdjustCounter {
            entity_type: EntityType::Resource,
            key: resource.key().clone(),
            field: "downloadCount",
            delta: 1,
            floor: Some(0),
            ceiling_field: None,
        });
        self.commit_one(batch).await
    }

    async fn without_hidden(
        &self,
        schema: &EntitySchema,
        records: Vec<Record>,
    ) -> AppResult<Vec<Record>> {
        let mut parents_deleted: HashMap<(EntityType, String), bool> = HashMap::new();
        let mut visible = Vec::with_capacity(records.len());

        'records: for record in records {
            if record.flag(SOFT_DELETE_FIELD) {
                continue;
            }

            for parent in schema.listing_parents() {
                let Some(parent_id) = record.text(parent.field) else {
                    continue;
                };
                let slot = (parent.target, parent_id.to_owned());
                let deleted = match parents_deleted.get(&slot) {
                    Some(deleted) => *deleted,
                    None => {
                        let deleted = self
                            .store
                            .find(parent.target, &RecordKey::single(parent_id))
                            .await?
                            .is_some_and(|parent| parent.flag(SOFT_DELETE_FIELD));
                        parents_deleted.insert(slot, deleted);
                        deleted
                    }
                };
                if deleted {
                    continue 'records;
                }
            }

            visible.push(record);
        }

        Ok(visible)
    }
}

use super::*;

impl LifecycleService {
    /// Applies a registration event and moves the event's seat counter.
    ///
    /// Confirming takes a seat with a conditional decrement that fails at
    /// zero; releasing a confirmed seat increments it up to the capacity.
    /// Both land in the same batch as the status change.
    pub async fn transition_registration(
        &self,
        subject: &Subject,
        key: &RecordKey,
        event: RegistrationEvent,
    ) -> AppResult<Record> {
        let registration = self
            .load_for_update(subject, EntityType::EventRegistration, key)
            .await?;
        let current = status_of::<EventRegistrationStatus>(&registration)?;
        let next = transition_registration(current, event)?;

        let mut batch = WriteBatch::new();
        batch.push(RecordWrite::replace(
            &registration,
            with_status(&registration, next.status.as_str()),
        ));

        let seat = match next.tickets {
            TicketEffect::None => None,
            TicketEffect::Reserve => Some((-1, Some(0), None)),
            TicketEffect::Release => Some((1, None, Some("capacity"))),
        };
        if let Some((delta, floor, ceiling_field)) = seat {
            let event_id = required_text(&registration, "eventId")?;
            batch.push(RecordWrite::AdjustCounter {
                entity_type: EntityType::Event,
                key: RecordKey::single(event_id),
                field: "ticketsAvailable",
                delta,
                floor,
                ceiling_field,
            });
        }

        self.commit_first(batch).await
    }
}

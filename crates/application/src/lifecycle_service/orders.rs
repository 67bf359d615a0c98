use super::*;

impl LifecycleService {
    /// Applies an order event to a resource or event order.
    ///
    /// Fulfillment is guarded by the order's line items, which stay pinned
    /// at the versions read until the new status commits.
    pub async fn transition_order(
        &self,
        subject: &Subject,
        entity_type: EntityType,
        key: &RecordKey,
        event: OrderEvent,
    ) -> AppResult<Record> {
        let items_type = match entity_type {
            EntityType::ResourceOrder => EntityType::ResourceOrderItem,
            EntityType::EventOrder => EntityType::EventRegistration,
            other => {
                return Err(AppError::Validation(format!(
                    "'{}' is not an order type",
                    other.as_str()
                )));
            }
        };

        let order = self.load_for_update(subject, entity_type, key).await?;
        let current = status_of::<OrderStatus>(&order)?;
        let items = self
            .store
            .find_by_field(items_type, "orderId", &order.key().to_string())
            .await?;
        let states = items
            .iter()
            .map(line_item_state)
            .collect::<AppResult<Vec<_>>>()?;

        let next = transition_order(current, event, &states)?;

        let mut batch = WriteBatch::new();
        batch.push(RecordWrite::replace(&order, with_status(&order, next.as_str())));
        batch.extend(items.iter().map(RecordWrite::expect));
        self.commit_first(batch).await
    }
}

fn line_item_state(item: &Record) -> AppResult<LineItemState> {
    let cancelled = match item.entity_type() {
        EntityType::EventRegistration => matches!(
            status_of::<EventRegistrationStatus>(item)?,
            EventRegistrationStatus::Cancelled
                | EventRegistrationStatus::Refunded
                | EventRegistrationStatus::Expired
        ),
        _ => matches!(
            status_of::<ResourceItemStatus>(item)?,
            ResourceItemStatus::Cancelled
                | ResourceItemStatus::Refunded
                | ResourceItemStatus::Expired
        ),
    };

    Ok(if cancelled {
        LineItemState::Cancelled
    } else {
        LineItemState::Open
    })
}

use super::*;

const DEFAULT_FAILURE: &str = "delivery failed";

impl LifecycleService {
    /// Applies a delivery event to a notification.
    pub async fn transition_notification(
        &self,
        subject: &Subject,
        key: &RecordKey,
        event: NotificationEvent,
        error: Option<String>,
    ) -> AppResult<Record> {
        self.transition_notification_at(subject, key, event, error, Utc::now())
            .await
    }

    /// Same as [`LifecycleService::transition_notification`] with an explicit
    /// clock.
    ///
    /// Dispatching stamps `sentAt` and counts an attempt, delivery stamps
    /// `deliveredAt`, and `lastAttemptError` is written only when the
    /// notification becomes FAILED.
    pub async fn transition_notification_at(
        &self,
        subject: &Subject,
        key: &RecordKey,
        event: NotificationEvent,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Record> {
        let notification = self
            .load_for_update(subject, EntityType::Notification, key)
            .await?;
        let current = status_of::<NotificationStatus>(&notification)?;
        let attempts = notification.integer("deliveryAttempts").unwrap_or(0);
        let attempts = u32::try_from(attempts).map_err(|_| {
            AppError::Validation(format!(
                "notification '{key}' has an invalid deliveryAttempts value"
            ))
        })?;

        let next = transition_notification(
            current,
            event,
            attempts,
            self.config.notification_max_delivery_attempts,
        )?;

        let mut data = with_status(&notification, next.status.as_str());
        if next.counts_attempt {
            data.insert(
                "deliveryAttempts".to_owned(),
                Value::from(i64::from(attempts) + 1),
            );
        }
        match next.status {
            NotificationStatus::Sent => {
                data.insert("sentAt".to_owned(), timestamp(now));
            }
            NotificationStatus::Delivered => {
                data.insert("deliveredAt".to_owned(), timestamp(now));
            }
            NotificationStatus::Failed => {
                let error = error
                    .filter(|error| !error.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE.to_owned());
                data.insert("lastAttemptError".to_owned(), Value::String(error));
            }
            NotificationStatus::Pending | NotificationStatus::Read => {}
        }

        let mut batch = WriteBatch::new();
        batch.push(RecordWrite::replace(&notification, data));
        self.commit_first(batch).await
    }
}

use enermina_core::{AppError, AppResult};

use super::invalid_transition;
use crate::NotificationStatus;

/// Event applied to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    /// Hand the notification to its channels.
    Dispatch,
    /// A channel confirmed delivery.
    Deliver,
    /// Dispatch or delivery failed.
    Fail,
    /// Queue a failed notification again.
    Retry,
    /// The recipient opened it.
    Read,
}

impl NotificationEvent {
    /// Returns the event name used in errors and routes.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::Deliver => "deliver",
            Self::Fail => "fail",
            Self::Retry => "retry",
            Self::Read => "read",
        }
    }
}

/// Outcome of a notification transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTransition {
    /// New status.
    pub status: NotificationStatus,
    /// True when the move counts as a delivery attempt.
    pub counts_attempt: bool,
}

/// Moves a notification to its next status.
///
/// Dispatching counts one delivery attempt, as does failing a notification
/// that never left PENDING. A retry is refused once `attempts` reached
/// `max_attempts`, leaving the notification terminally failed.
pub fn transition_notification(
    current: NotificationStatus,
    event: NotificationEvent,
    attempts: u32,
    max_attempts: u32,
) -> AppResult<NotificationTransition> {
    use NotificationStatus as Status;

    let (status, counts_attempt) = match (current, event) {
        (Status::Pending, NotificationEvent::Dispatch) => (Status::Sent, true),
        (Status::Pending, NotificationEvent::Fail) => (Status::Failed, true),
        (Status::Sent, NotificationEvent::Deliver) => (Status::Delivered, false),
        (Status::Sent, NotificationEvent::Fail) => (Status::Failed, false),
        (Status::Failed, NotificationEvent::Retry) => {
            if attempts >= max_attempts {
                return Err(AppError::PreconditionFailed(format!(
                    "notification reached its {max_attempts} delivery attempts"
                )));
            }
            (Status::Pending, false)
        }
        (Status::Delivered, NotificationEvent::Read) => (Status::Read, false),
        _ => return Err(invalid_transition("notification", current, event.as_str())),
    };

    Ok(NotificationTransition {
        status,
        counts_attempt,
    })
}

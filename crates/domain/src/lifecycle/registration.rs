use enermina_core::AppResult;

use super::invalid_transition;
use crate::EventRegistrationStatus;

/// Event applied to an event registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationEvent {
    /// Reserve a seat.
    Confirm,
    /// Attendee arrived.
    CheckIn,
    /// Attendee did not arrive.
    MarkNoShow,
    /// Attendee or organiser withdrew.
    Cancel,
    /// Payment returned.
    Refund,
    /// Registration lapsed.
    Expire,
}

impl RegistrationEvent {
    /// Returns the event name used in errors and routes.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::CheckIn => "check in",
            Self::MarkNoShow => "mark no-show",
            Self::Cancel => "cancel",
            Self::Refund => "refund",
            Self::Expire => "expire",
        }
    }
}

/// Change to the event's `ticketsAvailable` counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketEffect {
    /// Counter unchanged.
    None,
    /// Decrement by one, failing at zero.
    Reserve,
    /// Increment by one, bounded by capacity.
    Release,
}

/// Outcome of a registration transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationTransition {
    /// New registration status.
    pub status: EventRegistrationStatus,
    /// Counter adjustment committed with the status.
    pub tickets: TicketEffect,
}

/// Moves a registration to its next status.
///
/// A confirmed registration holds one seat until it is cancelled, refunded
/// or expires; checked-in and no-show registrations keep theirs.
pub fn transition_registration(
    current: EventRegistrationStatus,
    event: RegistrationEvent,
) -> AppResult<RegistrationTransition> {
    use EventRegistrationStatus as Status;

    let (status, tickets) = match (current, event) {
        (Status::Pending, RegistrationEvent::Confirm) => (Status::Confirmed, TicketEffect::Reserve),
        (Status::Confirmed, RegistrationEvent::CheckIn) => (Status::CheckedIn, TicketEffect::None),
        (Status::Confirmed, RegistrationEvent::MarkNoShow) => (Status::NoShow, TicketEffect::None),
        (Status::Pending | Status::Confirmed, RegistrationEvent::Cancel) => {
            (Status::Cancelled, release_if_held(current))
        }
        (Status::Pending | Status::Confirmed, RegistrationEvent::Refund) => {
            (Status::Refunded, release_if_held(current))
        }
        (Status::Pending | Status::Confirmed, RegistrationEvent::Expire) => {
            (Status::Expired, release_if_held(current))
        }
        _ => return Err(invalid_transition("registration", current, event.as_str())),
    };

    Ok(RegistrationTransition { status, tickets })
}

fn release_if_held(current: EventRegistrationStatus) -> TicketEffect {
    if current == EventRegistrationStatus::Confirmed {
        TicketEffect::Release
    } else {
        TicketEffect::None
    }
}

//! Lifecycle state machines.
//!
//! Every machine is a total function of the current state, an event and the
//! guard facts the caller read alongside the record. Illegal moves return
//! [`enermina_core::AppError::InvalidTransition`]; failed guards return
//! [`enermina_core::AppError::PreconditionFailed`]. Nothing here touches
//! storage, so the caller commits the resulting state together with the
//! version guards that make the decision hold at commit.

mod invoice;
mod notification;
mod order;
mod payment;
mod registration;

pub use invoice::{InvoiceEvent, InvoiceFacts, reconcile_invoice, settled_total, transition_invoice};
pub use notification::{NotificationEvent, NotificationTransition, transition_notification};
pub use order::{LineItemState, OrderEvent, transition_order};
pub use payment::{InvoiceBalance, PaymentOutcome, retry_payment, settle_payment};
pub use registration::{
    RegistrationEvent, RegistrationTransition, TicketEffect, transition_registration,
};

use enermina_core::AppError;

fn invalid_transition(machine: &str, from: impl std::fmt::Display, event: &str) -> AppError {
    AppError::InvalidTransition(format!("{machine} cannot {event} from {from}"))
}

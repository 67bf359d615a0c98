use chrono::{DateTime, Utc};
use enermina_core::{AppError, AppResult};
use rust_decimal::Decimal;

use super::invalid_transition;
use crate::{InvoiceStatus, PaymentTransactionStatus};

/// Explicit event applied to an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceEvent {
    /// Successful payments cover the total.
    Settle,
    /// The due date passed without full payment.
    MarkOverdue,
    /// The invoice is voided.
    Cancel,
}

impl InvoiceEvent {
    fn as_str(self) -> &'static str {
        match self {
            Self::Settle => "settle",
            Self::MarkOverdue => "mark overdue",
            Self::Cancel => "cancel",
        }
    }
}

/// Facts an invoice transition is guarded by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceFacts {
    /// Invoice `totalAmount`.
    pub total: Decimal,
    /// Sum of successful transaction amounts.
    pub settled: Decimal,
    /// Invoice `dueDate`.
    pub due_date: DateTime<Utc>,
    /// Evaluation instant.
    pub now: DateTime<Utc>,
}

/// Sums the amounts of successful transactions.
///
/// Failed, pending and refunded transactions never reduce the due balance.
pub fn settled_total<I>(transactions: I) -> Decimal
where
    I: IntoIterator<Item = (PaymentTransactionStatus, Decimal)>,
{
    transactions
        .into_iter()
        .filter(|(status, _)| *status == PaymentTransactionStatus::Success)
        .map(|(_, amount)| amount)
        .sum()
}

/// Applies an explicit event to an invoice.
pub fn transition_invoice(
    current: InvoiceStatus,
    event: InvoiceEvent,
    facts: &InvoiceFacts,
) -> AppResult<InvoiceStatus> {
    let open = matches!(current, InvoiceStatus::Unpaid | InvoiceStatus::Overdue);

    match event {
        InvoiceEvent::Settle if open => {
            if facts.settled < facts.total {
                return Err(AppError::PreconditionFailed(format!(
                    "successful payments ({}) do not cover the total ({})",
                    facts.settled, facts.total
                )));
            }
            Ok(InvoiceStatus::Paid)
        }
        InvoiceEvent::MarkOverdue if current == InvoiceStatus::Unpaid => {
            if facts.now <= facts.due_date {
                return Err(AppError::PreconditionFailed(format!(
                    "invoice is not due before {}",
                    facts.due_date.to_rfc3339()
                )));
            }
            if facts.settled >= facts.total {
                return Err(AppError::PreconditionFailed(
                    "invoice is fully paid".to_owned(),
                ));
            }
            Ok(InvoiceStatus::Overdue)
        }
        InvoiceEvent::Cancel if open => Ok(InvoiceStatus::Cancelled),
        _ => Err(invalid_transition("invoice", current, event.as_str())),
    }
}

/// Recomputes the status implied by the current payments.
///
/// Open invoices whose successful payments cover the total become paid;
/// every other status is kept. Applying it twice changes nothing.
#[must_use]
pub fn reconcile_invoice(current: InvoiceStatus, total: Decimal, settled: Decimal) -> InvoiceStatus {
    let open = matches!(current, InvoiceStatus::Unpaid | InvoiceStatus::Overdue);
    if open && settled >= total {
        InvoiceStatus::Paid
    } else {
        current
    }
}

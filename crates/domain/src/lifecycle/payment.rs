use enermina_core::{AppError, AppResult};
use rust_decimal::Decimal;

use super::invalid_transition;
use crate::{InvoiceStatus, PaymentTransactionStatus};

/// Result reported by the payment processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Funds were captured.
    Success,
    /// The payment was declined or errored.
    Failed {
        /// Processor message kept in the transaction notes.
        reason: String,
    },
}

/// Invoice state a settlement is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceBalance {
    /// Current invoice status.
    pub status: InvoiceStatus,
    /// Invoice `totalAmount`.
    pub total: Decimal,
    /// Sum of successful transactions already recorded.
    pub settled: Decimal,
}

/// Settles a pending transaction.
///
/// A success must fit in the remaining balance of an open invoice, so the
/// sum of successful amounts never exceeds the total.
pub fn settle_payment(
    current: PaymentTransactionStatus,
    outcome: &PaymentOutcome,
    amount: Decimal,
    invoice: &InvoiceBalance,
) -> AppResult<PaymentTransactionStatus> {
    if current != PaymentTransactionStatus::Pending {
        return Err(invalid_transition("payment transaction", current, "settle"));
    }

    match outcome {
        PaymentOutcome::Failed { .. } => Ok(PaymentTransactionStatus::Failed),
        PaymentOutcome::Success => {
            if !matches!(invoice.status, InvoiceStatus::Unpaid | InvoiceStatus::Overdue) {
                return Err(AppError::PreconditionFailed(format!(
                    "invoice is {} and accepts no payments",
                    invoice.status
                )));
            }
            if invoice.settled + amount > invoice.total {
                return Err(AppError::PreconditionFailed(format!(
                    "payment of {amount} exceeds the outstanding balance of {}",
                    invoice.total - invoice.settled
                )));
            }
            Ok(PaymentTransactionStatus::Success)
        }
    }
}

/// Checks that a failed transaction may be retried.
///
/// Returns the status of the replacement transaction. `failed_attempts`
/// counts the failed transactions already recorded for the invoice.
pub fn retry_payment(
    current: PaymentTransactionStatus,
    failed_attempts: u32,
    max_attempts: u32,
) -> AppResult<PaymentTransactionStatus> {
    if current != PaymentTransactionStatus::Failed {
        return Err(invalid_transition("payment transaction", current, "retry"));
    }
    if failed_attempts >= max_attempts {
        return Err(AppError::PreconditionFailed(format!(
            "payment already failed {failed_attempts} times; the limit is {max_attempts}"
        )));
    }

    Ok(PaymentTransactionStatus::Pending)
}

use enermina_core::{AppError, AppResult};

use super::invalid_transition;
use crate::OrderStatus;

/// Event applied to a resource or event order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    /// Every line item was delivered.
    Fulfill,
    /// The buyer withdrew the order.
    Cancel,
    /// The seller refused the order.
    Reject,
}

impl OrderEvent {
    /// Returns the event name used in errors and routes.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fulfill => "fulfill",
            Self::Cancel => "cancel",
            Self::Reject => "reject",
        }
    }
}

/// Line item as seen by the fulfillment guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineItemState {
    /// Item still counts toward the order.
    Open,
    /// Item was cancelled.
    Cancelled,
}

/// Moves an order to its next status.
///
/// Only pending orders move; every other status is terminal. Fulfillment
/// needs at least one line item and no cancelled ones.
pub fn transition_order(
    current: OrderStatus,
    event: OrderEvent,
    line_items: &[LineItemState],
) -> AppResult<OrderStatus> {
    if current != OrderStatus::Pending {
        return Err(invalid_transition("order", current, event.as_str()));
    }

    match event {
        OrderEvent::Fulfill => {
            if line_items.is_empty() {
                return Err(AppError::PreconditionFailed(
                    "order has no line items to fulfill".to_owned(),
                ));
            }
            if line_items.contains(&LineItemState::Cancelled) {
                return Err(AppError::PreconditionFailed(
                    "order has cancelled line items".to_owned(),
                ));
            }
            Ok(OrderStatus::Fulfilled)
        }
        OrderEvent::Cancel => Ok(OrderStatus::Cancelled),
        OrderEvent::Reject => Ok(OrderStatus::Rejected),
    }
}

use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use enermina_core::AppError;
use enermina_domain::lifecycle::{
    InvoiceEvent, NotificationEvent, OrderEvent, PaymentOutcome, RegistrationEvent,
};
use enermina_domain::{EntityType, RecordKey, Subject};
use tracing::info;

use crate::dto::{RecordResponse, TransitionRequest};
use crate::error::ApiResult;
use crate::handlers::records::parse_entity_type;
use crate::state::AppState;

/// Applies a named lifecycle event to a stateful record.
pub async fn transition_record_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((entity_name, key)): Path<(String, String)>,
    Json(payload): Json<TransitionRequest>,
) -> ApiResult<Json<RecordResponse>> {
    let entity_type = parse_entity_type(&entity_name)?;
    let key = RecordKey::from_str(&key)?;
    let event = payload.event.trim();
    let lifecycle = &state.lifecycle_service;

    let record = match entity_type {
        EntityType::ResourceOrder | EntityType::EventOrder => {
            lifecycle
                .transition_order(&subject, entity_type, &key, order_event(event)?)
                .await?
        }
        EntityType::Invoice if event == "reconcile" => {
            lifecycle.reconcile_invoice(&subject, &key).await?
        }
        EntityType::Invoice => {
            lifecycle
                .transition_invoice(&subject, &key, invoice_event(event)?)
                .await?
        }
        EntityType::PaymentTransaction => match event {
            "succeed" => {
                lifecycle
                    .settle_payment(&subject, &key, PaymentOutcome::Success)
                    .await?
            }
            "fail" => {
                let reason = payload.reason.unwrap_or_default();
                lifecycle
                    .settle_payment(&subject, &key, PaymentOutcome::Failed { reason })
                    .await?
            }
            "retry" => lifecycle.retry_payment(&subject, &key).await?,
            other => return Err(unknown_event(entity_type, other, "succeed, fail, retry").into()),
        },
        EntityType::EventRegistration => {
            lifecycle
                .transition_registration(&subject, &key, registration_event(event)?)
                .await?
        }
        EntityType::Notification => {
            lifecycle
                .transition_notification(&subject, &key, notification_event(event)?, payload.reason)
                .await?
        }
        other => {
            return Err(AppError::Validation(format!(
                "'{}' records have no lifecycle",
                other.as_str()
            ))
            .into());
        }
    };

    info!(
        entity_type = entity_type.as_str(),
        key = %record.key(),
        event,
        subject = %subject.label(),
        "lifecycle transition applied"
    );

    Ok(Json(RecordResponse::from(record)))
}

fn order_event(name: &str) -> Result<OrderEvent, AppError> {
    match name {
        "fulfill" => Ok(OrderEvent::Fulfill),
        "cancel" => Ok(OrderEvent::Cancel),
        "reject" => Ok(OrderEvent::Reject),
        other => Err(unknown_event(EntityType::ResourceOrder, other, "fulfill, cancel, reject")),
    }
}

fn invoice_event(name: &str) -> Result<InvoiceEvent, AppError> {
    match name {
        "settle" => Ok(InvoiceEvent::Settle),
        "mark-overdue" => Ok(InvoiceEvent::MarkOverdue),
        "cancel" => Ok(InvoiceEvent::Cancel),
        other => Err(unknown_event(
            EntityType::Invoice,
            other,
            "settle, mark-overdue, cancel, reconcile",
        )),
    }
}

fn registration_event(name: &str) -> Result<RegistrationEvent, AppError> {
    match name {
        "confirm" => Ok(RegistrationEvent::Confirm),
        "check-in" => Ok(RegistrationEvent::CheckIn),
        "mark-no-show" => Ok(RegistrationEvent::MarkNoShow),
        "cancel" => Ok(RegistrationEvent::Cancel),
        "refund" => Ok(RegistrationEvent::Refund),
        "expire" => Ok(RegistrationEvent::Expire),
        other => Err(unknown_event(
            EntityType::EventRegistration,
            other,
            "confirm, check-in, mark-no-show, cancel, refund, expire",
        )),
    }
}

fn notification_event(name: &str) -> Result<NotificationEvent, AppError> {
    match name {
        "dispatch" => Ok(NotificationEvent::Dispatch),
        "deliver" => Ok(NotificationEvent::Deliver),
        "fail" => Ok(NotificationEvent::Fail),
        "retry" => Ok(NotificationEvent::Retry),
        "read" => Ok(NotificationEvent::Read),
        other => Err(unknown_event(
            EntityType::Notification,
            other,
            "dispatch, deliver, fail, retry, read",
        )),
    }
}

fn unknown_event(entity_type: EntityType, event: &str, expected: &str) -> AppError {
    AppError::Validation(format!(
        "unknown {} event '{event}', expected one of: {expected}",
        entity_type.as_str()
    ))
}

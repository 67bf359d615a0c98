use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use enermina_core::{AppError, AppResult};
use enermina_domain::lifecycle::{
    InvoiceBalance, InvoiceEvent, InvoiceFacts, LineItemState, NotificationEvent, OrderEvent,
    PaymentOutcome, RegistrationEvent, TicketEffect, reconcile_invoice, retry_payment,
    settle_payment, settled_total, transition_invoice, transition_notification, transition_order,
    transition_registration,
};
use enermina_domain::{
    EntityType, EventRegistrationStatus, InvoiceStatus, NotificationStatus, Operation,
    OrderStatus, PaymentTransactionStatus, Record, RecordKey, ResourceItemStatus, Subject,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AuthorizationService;
use crate::record_ports::{RecordStore, RecordWrite, WriteBatch};

mod invoices;
mod notifications;
mod orders;
mod payments;
mod registrations;

/// Retry ceilings of the lifecycle machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Delivery attempts after which a failed notification is not retried.
    pub notification_max_delivery_attempts: u32,
    /// Failed transactions per invoice after which no retry is created.
    pub payment_max_attempts: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            notification_max_delivery_attempts: 3,
            payment_max_attempts: 3,
        }
    }
}

/// Application service applying lifecycle events to stateful records.
///
/// Each event reads the record and the records its guard depends on, asks
/// the domain machine for the next state and commits the state change with
/// version guards on everything it read.
#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn RecordStore>,
    authorization_service: AuthorizationService,
    config: LifecycleConfig,
}

impl LifecycleService {
    /// Creates a new lifecycle service.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        authorization_service: AuthorizationService,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            store,
            authorization_service,
            config,
        }
    }

    /// Returns the retry ceilings in effect.
    #[must_use]
    pub fn config(&self) -> LifecycleConfig {
        self.config
    }

    /// Loads a record the subject may update.
    async fn load_for_update(
        &self,
        subject: &Subject,
        entity_type: EntityType,
        key: &RecordKey,
    ) -> AppResult<Record> {
        self.authorization_service
            .schema(entity_type)?
            .validate_key(key)?;
        self.authorization_service
            .ensure_enabled(entity_type, Operation::Update)?;

        let record = self.store.find(entity_type, key).await?.ok_or_else(|| {
            AppError::NotFound(format!("{} '{key}' does not exist", entity_type.as_str()))
        })?;
        self.authorization_service
            .require_on_record(subject, Operation::Update, &record)?;
        Ok(record)
    }

    async fn load_reference(
        &self,
        record: &Record,
        field: &str,
        target: EntityType,
    ) -> AppResult<Record> {
        let id = required_text(record, field)?;
        self.store
            .find(target, &RecordKey::single(id))
            .await?
            .ok_or_else(|| {
                AppError::DanglingReference(format!(
                    "'{field}' of {} '{}' points at missing {} '{id}'",
                    record.entity_type().as_str(),
                    record.key(),
                    target.as_str()
                ))
            })
    }

    async fn commit_first(&self, batch: WriteBatch) -> AppResult<Record> {
        self.store
            .commit(batch)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("record store returned no written record".to_owned()))
    }
}

fn status_of<T>(record: &Record) -> AppResult<T>
where
    T: FromStr<Err = AppError>,
{
    record.tag::<T>("status")?.ok_or_else(|| {
        AppError::Validation(format!(
            "{} '{}' has no status",
            record.entity_type().as_str(),
            record.key()
        ))
    })
}

fn required_text<'a>(record: &'a Record, field: &str) -> AppResult<&'a str> {
    record.text(field).ok_or_else(|| {
        AppError::Validation(format!(
            "{} '{}' has no '{field}'",
            record.entity_type().as_str(),
            record.key()
        ))
    })
}

fn required_amount(record: &Record, field: &str) -> AppResult<Decimal> {
    record.decimal(field)?.ok_or_else(|| {
        AppError::Validation(format!(
            "{} '{}' has no '{field}'",
            record.entity_type().as_str(),
            record.key()
        ))
    })
}

fn with_status(record: &Record, status: &str) -> Map<String, Value> {
    let mut data = record.data().clone();
    data.insert("status".to_owned(), Value::String(status.to_owned()));
    data
}

fn timestamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

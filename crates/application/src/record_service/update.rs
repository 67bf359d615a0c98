use enermina_domain::PaymentTransactionStatus;
use enermina_domain::lifecycle::settled_total;
use enermina_domain::record::decimal_field;
use rust_decimal::Decimal;

use super::references::exists_guard;
use super::*;

const INVOICE_AMOUNT_FIELDS: &[&str] = &["subTotal", "discount", "taxes", "totalAmount"];

impl RecordService {
    /// Merges a patch into a stored record.
    ///
    /// The replace is guarded by the version that was authorized, so a
    /// concurrent change to the owner or state fails the update instead of
    /// being overwritten.
    pub async fn update_record(
        &self,
        subject: &Subject,
        entity_type: EntityType,
        key: &RecordKey,
        patch: Value,
    ) -> AppResult<Record> {
        let schema = self.authorization_service.schema(entity_type)?;
        schema.validate_key(key)?;
        self.authorization_service
            .ensure_enabled(entity_type, Operation::Update)?;

        let patch = payload_object(patch)?;
        let existing = self.require_record(entity_type, key).await?;
        self.authorization_service
            .require_on_record(subject, Operation::Update, &existing)?;

        let base = match entity_type {
            EntityType::Event => rebase_seats(&existing, &patch)?,
            _ => existing.data().clone(),
        };
        let data = schema.normalize_update(&base, patch)?;
        let resolved = self.resolve_references(schema, &data).await?;

        let mut batch = WriteBatch::new();
        batch.push(RecordWrite::replace(&existing, data.clone()));
        batch.extend(resolved.iter().map(|(_, record)| exists_guard(record)));
        if entity_type == EntityType::Invoice {
            batch.extend(self.invoice_amount_guards(&existing, &data).await?);
        }

        self.commit_one(batch).await
    }

    /// Checks a change to invoice amounts against the payments already made.
    ///
    /// Amounts are fixed once the invoice leaves UNPAID, and the total never
    /// drops below the successful payments. The transactions the decision
    /// read are pinned for the commit.
    async fn invoice_amount_guards(
        &self,
        existing: &Record,
        data: &Map<String, Value>,
    ) -> AppResult<Vec<RecordWrite>> {
        let touched = INVOICE_AMOUNT_FIELDS
            .iter()
            .any(|field| existing.data().get(*field) != data.get(*field));
        if !touched {
            return Ok(Vec::new());
        }

        let status = existing.tag::<InvoiceStatus>("status")?;
        if status != Some(InvoiceStatus::Unpaid) {
            return Err(AppError::PreconditionFailed(format!(
                "amounts of invoice '{}' are fixed once it is no longer UNPAID",
                existing.key()
            )));
        }

        let transactions = self
            .store
            .find_by_field(
                EntityType::PaymentTransaction,
                "invoiceId",
                &existing.key().to_string(),
            )
            .await?;
        let amounts = transactions
            .iter()
            .map(|transaction| {
                let status = transaction
                    .tag::<PaymentTransactionStatus>("status")?
                    .unwrap_or(PaymentTransactionStatus::Pending);
                let amount = transaction.decimal("amount")?.unwrap_or(Decimal::ZERO);
                Ok((status, amount))
            })
            .collect::<AppResult<Vec<_>>>()?;
        let settled = settled_total(amounts);
        let total = decimal_field(data, "totalAmount")?.unwrap_or(Decimal::ZERO);
        if total < settled {
            return Err(AppError::PreconditionFailed(format!(
                "invoice total ({total}) cannot drop below its successful payments ({settled})"
            )));
        }

        Ok(transactions.iter().map(RecordWrite::expect).collect())
    }
}

/// Moves an event's free seats along with a capacity change.
///
/// Seats already held (`capacity - ticketsAvailable`) stay held, so a
/// capacity below them is refused. The update's version guard keeps the
/// held count stable until commit.
fn rebase_seats(existing: &Record, patch: &Map<String, Value>) -> AppResult<Map<String, Value>> {
    let mut base = existing.data().clone();
    let (Some(capacity), Some(available)) = (
        existing.integer("capacity"),
        existing.integer("ticketsAvailable"),
    ) else {
        return Ok(base);
    };
    let Some(next_capacity) = patch.get("capacity").and_then(Value::as_i64) else {
        return Ok(base);
    };
    if next_capacity == capacity {
        return Ok(base);
    }

    let held = capacity - available;
    if next_capacity < held {
        return Err(AppError::PreconditionFailed(format!(
            "event '{}' already holds {held} seats, capacity {next_capacity} is too small",
            existing.key()
        )));
    }

    base.insert(
        "ticketsAvailable".to_owned(),
        Value::from(next_capacity - held),
    );
    Ok(base)
}

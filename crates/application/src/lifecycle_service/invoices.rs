use super::*;

/// Invoice with the transactions its status is derived from.
pub(super) struct InvoiceLedger {
    pub(super) invoice: Record,
    pub(super) transactions: Vec<Record>,
    pub(super) total: Decimal,
    pub(super) settled: Decimal,
}

impl LifecycleService {
    /// Applies an explicit invoice event at the current time.
    pub async fn transition_invoice(
        &self,
        subject: &Subject,
        key: &RecordKey,
        event: InvoiceEvent,
    ) -> AppResult<Record> {
        self.transition_invoice_at(subject, key, event, Utc::now())
            .await
    }

    /// Applies an explicit invoice event as of `now`.
    pub async fn transition_invoice_at(
        &self,
        subject: &Subject,
        key: &RecordKey,
        event: InvoiceEvent,
        now: DateTime<Utc>,
    ) -> AppResult<Record> {
        let invoice = self
            .load_for_update(subject, EntityType::Invoice, key)
            .await?;
        let ledger = self.ledger(invoice).await?;
        let current = status_of::<InvoiceStatus>(&ledger.invoice)?;
        let due_date = required_text(&ledger.invoice, "dueDate")?;
        let due_date = DateTime::parse_from_rfc3339(due_date)
            .map(|due_date| due_date.with_timezone(&Utc))
            .map_err(|error| AppError::Validation(format!("invalid invoice dueDate: {error}")))?;

        let next = transition_invoice(
            current,
            event,
            &InvoiceFacts {
                total: ledger.total,
                settled: ledger.settled,
                due_date,
                now,
            },
        )?;

        self.commit_invoice_status(ledger, next).await
    }

    /// Recomputes an invoice status from its successful transactions.
    ///
    /// Idempotent: an invoice already in its derived status is returned
    /// without writing.
    pub async fn reconcile_invoice(&self, subject: &Subject, key: &RecordKey) -> AppResult<Record> {
        let invoice = self
            .load_for_update(subject, EntityType::Invoice, key)
            .await?;
        let ledger = self.ledger(invoice).await?;
        let current = status_of::<InvoiceStatus>(&ledger.invoice)?;
        let next = reconcile_invoice(current, ledger.total, ledger.settled);

        if next == current {
            return Ok(ledger.invoice);
        }

        self.commit_invoice_status(ledger, next).await
    }

    pub(super) async fn ledger(&self, invoice: Record) -> AppResult<InvoiceLedger> {
        let transactions = self
            .store
            .find_by_field(
                EntityType::PaymentTransaction,
                "invoiceId",
                &invoice.key().to_string(),
            )
            .await?;
        let amounts = transactions
            .iter()
            .map(|transaction| {
                Ok((
                    status_of::<PaymentTransactionStatus>(transaction)?,
                    required_amount(transaction, "amount")?,
                ))
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(InvoiceLedger {
            total: required_amount(&invoice, "totalAmount")?,
            settled: settled_total(amounts),
            invoice,
            transactions,
        })
    }

    async fn commit_invoice_status(
        &self,
        ledger: InvoiceLedger,
        next: InvoiceStatus,
    ) -> AppResult<Record> {
        let mut batch = WriteBatch::new();
        batch.push(RecordWrite::replace(
            &ledger.invoice,
            with_status(&ledger.invoice, next.as_str()),
        ));
        batch.extend(ledger.transactions.iter().map(RecordWrite::expect));
        self.commit_first(batch).await
    }
}

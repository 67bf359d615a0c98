use super::*;

impl LifecycleService {
    /// Records the processor outcome of a pending transaction.
    ///
    /// A success recomputes the invoice status in the same batch; a failure
    /// leaves the due balance untouched and keeps the reason in `notes`.
    pub async fn settle_payment(
        &self,
        subject: &Subject,
        key: &RecordKey,
        outcome: PaymentOutcome,
    ) -> AppResult<Record> {
        let transaction = self
            .load_for_update(subject, EntityType::PaymentTransaction, key)
            .await?;
        let current = status_of::<PaymentTransactionStatus>(&transaction)?;
        let amount = required_amount(&transaction, "amount")?;
        let invoice = self
            .load_reference(&transaction, "invoiceId", EntityType::Invoice)
            .await?;
        let ledger = self.ledger(invoice).await?;
        let invoice_status = status_of::<InvoiceStatus>(&ledger.invoice)?;

        let next = settle_payment(
            current,
            &outcome,
            amount,
            &InvoiceBalance {
                status: invoice_status,
                total: ledger.total,
                settled: ledger.settled,
            },
        )?;

        let mut data = with_status(&transaction, next.as_str());
        if let PaymentOutcome::Failed { reason } = &outcome {
            data.insert("notes".to_owned(), Value::String(reason.clone()));
        }

        let mut batch = WriteBatch::new();
        batch.push(RecordWrite::replace(&transaction, data));
        batch.extend(
            ledger
                .transactions
                .iter()
                .filter(|other| other.key() != transaction.key())
                .map(RecordWrite::expect),
        );

        let settled = match next {
            PaymentTransactionStatus::Success => ledger.settled + amount,
            _ => ledger.settled,
        };
        let invoice_next = reconcile_invoice(invoice_status, ledger.total, settled);
        if invoice_next == invoice_status {
            batch.push(RecordWrite::expect(&ledger.invoice));
        } else {
            batch.push(RecordWrite::replace(
                &ledger.invoice,
                with_status(&ledger.invoice, invoice_next.as_str()),
            ));
        }

        self.commit_first(batch).await
    }

    /// Creates a new pending transaction retrying a failed one.
    ///
    /// The retry is keyed `<failed id>-retry`, so retrying the same failure
    /// twice fails with `AlreadyExists`. Retries stop once the invoice has
    /// accumulated the configured number of failed transactions.
    pub async fn retry_payment(&self, subject: &Subject, key: &RecordKey) -> AppResult<Record> {
        self.retry_payment_at(subject, key, Utc::now()).await
    }

    /// Same as [`LifecycleService::retry_payment`] with an explicit clock.
    pub async fn retry_payment_at(
        &self,
        subject: &Subject,
        key: &RecordKey,
        now: DateTime<Utc>,
    ) -> AppResult<Record> {
        let failed = self
            .load_for_update(subject, EntityType::PaymentTransaction, key)
            .await?;
        let current = status_of::<PaymentTransactionStatus>(&failed)?;
        let invoice = self
            .load_reference(&failed, "invoiceId", EntityType::Invoice)
            .await?;
        let ledger = self.ledger(invoice).await?;

        let failed_attempts = ledger
            .transactions
            .iter()
            .map(status_of::<PaymentTransactionStatus>)
            .collect::<AppResult<Vec<_>>>()?
            .into_iter()
            .filter(|status| *status == PaymentTransactionStatus::Failed)
            .count();
        let failed_attempts = u32::try_from(failed_attempts).unwrap_or(u32::MAX);

        let status = retry_payment(current, failed_attempts, self.config.payment_max_attempts)?;
        if matches!(
            status_of::<InvoiceStatus>(&ledger.invoice)?,
            InvoiceStatus::Paid | InvoiceStatus::Cancelled
        ) {
            return Err(AppError::PreconditionFailed(format!(
                "invoice '{}' no longer accepts payments",
                ledger.invoice.key()
            )));
        }

        let retry_id = format!("{}-retry", required_text(&failed, "id")?);
        let mut data = with_status(&failed, status.as_str());
        data.insert("id".to_owned(), Value::String(retry_id.clone()));
        data.insert("transactionDate".to_owned(), timestamp(now));
        data.remove("transactionID");
        data.remove("notes");

        let mut batch = WriteBatch::new();
        batch.push(RecordWrite::Insert {
            entity_type: EntityType::PaymentTransaction,
            key: RecordKey::single(retry_id),
            data,
        });
        batch.push(RecordWrite::expect(&failed));
        batch.push(RecordWrite::expect(&ledger.invoice));
        self.commit_first(batch).await
    }
}

// Payment collection business logic
//
// Implements:
// - FIFO allocation of a payment inside one locked transaction
// - Allocation preview for UIs that auto-select entries
// - Ledger entry posting and cancellation

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{AppError, BusinessCalendar, Result, RetryPolicy};
use crate::modules::receivables::{
    models::{AllocationPlan, AllocationResult, LedgerEntry, PaymentMethod, Receipt},
    repositories::LedgerRepository,
    services::FifoAllocator,
};

/// A payment to place against a client's receivables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub client_id: String,
    pub amount: Decimal,
    /// Manual selection; `None` means every eligible entry of the client
    pub eligible_ledger_ids: Option<Vec<String>>,
    pub method: PaymentMethod,
    /// Receipt date; defaults to today's business date
    pub date: Option<NaiveDate>,
}

/// Service for receivable allocation
pub struct ReceivableService {
    repository: Arc<dyn LedgerRepository>,
    retry: RetryPolicy,
    calendar: BusinessCalendar,
}

impl ReceivableService {
    pub fn new(
        repository: Arc<dyn LedgerRepository>,
        retry: RetryPolicy,
        calendar: BusinessCalendar,
    ) -> Self {
        Self {
            repository,
            retry,
            calendar,
        }
    }

    /// Allocate a payment oldest-debt-first and record receipts.
    ///
    /// Reads, plans and writes under one row-locked transaction; on
    /// `ConcurrencyConflict` the whole operation is retried from the read.
    ///
    /// # Errors
    /// * `OverAllocation` - payment exceeds the selected outstanding balance;
    ///   nothing is written
    /// * `ConcurrencyConflict` - retry budget exhausted
    pub async fn allocate_payment(&self, request: &PaymentRequest) -> Result<AllocationResult> {
        if request.amount <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Payment amount must be positive, got: {}",
                request.amount
            )));
        }

        let date = request.date.unwrap_or_else(|| self.calendar.today());

        info!(
            client_id = request.client_id.as_str(),
            amount = %request.amount,
            method = %request.method,
            manual_selection = request.eligible_ledger_ids.is_some(),
            "Allocating payment"
        );

        let result = self
            .retry
            .run("allocate_payment", move || self.allocate_once(request, date))
            .await?;

        info!(
            client_id = request.client_id.as_str(),
            entries_touched = result.updated_entries.len(),
            receipts = result.receipts.len(),
            "Payment allocated"
        );

        Ok(result)
    }

    async fn allocate_once(
        &self,
        request: &PaymentRequest,
        date: NaiveDate,
    ) -> Result<AllocationResult> {
        let (mut uow, result) = self
            .retry
            .within_deadline("allocate_payment", async {
                let mut uow = self.repository.begin().await?;

                let entries = uow.list_eligible_ledger_entries(&request.client_id).await?;

                // Fails before any write; dropping `uow` rolls back and releases the locks
                let plan = FifoAllocator::plan(
                    &request.client_id,
                    request.amount,
                    &entries,
                    request.eligible_ledger_ids.as_deref(),
                )?;

                let result = FifoAllocator::apply(&plan, &entries, date, request.method)?;

                uow.persist_allocation(&result.plan, &result.updated_entries, &result.receipts)
                    .await?;
                Ok((uow, result))
            })
            .await?;

        uow.commit().await?;
        Ok(result)
    }

    /// Plan without writing anything
    pub async fn preview_allocation(
        &self,
        client_id: &str,
        amount: Decimal,
        eligible_ledger_ids: Option<&[String]>,
    ) -> Result<AllocationPlan> {
        let mut uow = self.repository.begin().await?;
        let entries = uow.list_eligible_ledger_entries(client_id).await?;
        FifoAllocator::plan(client_id, amount, &entries, eligible_ledger_ids)
    }

    /// Post a ledger entry for an issued invoice
    pub async fn post_ledger_entry(
        &self,
        client_id: String,
        ledger_date: NaiveDate,
        total_amount: Decimal,
    ) -> Result<LedgerEntry> {
        let entry = LedgerEntry::new(client_id, ledger_date, total_amount)?;
        self.repository.insert_entry(&entry).await?;

        info!(
            ledger_entry_id = entry.id.as_str(),
            client_id = entry.client_id.as_str(),
            total = %entry.total_amount,
            "Ledger entry posted"
        );

        Ok(entry)
    }

    /// Cancel an unpaid ledger entry so it leaves the allocation pool
    pub async fn cancel_ledger_entry(
        &self,
        client_id: &str,
        ledger_entry_id: &str,
    ) -> Result<LedgerEntry> {
        self.retry
            .run("cancel_ledger_entry", move || async move {
                let (mut uow, entry) = self
                    .retry
                    .within_deadline("cancel_ledger_entry", async {
                        let mut uow = self.repository.begin().await?;
                        let mut entry = uow
                            .find_entry_for_update(client_id, ledger_entry_id)
                            .await?
                            .ok_or_else(|| {
                                AppError::not_found(format!("Ledger entry '{}'", ledger_entry_id))
                            })?;

                        entry.cancel()?;
                        uow.update_entry_status(&entry).await?;
                        Ok((uow, entry))
                    })
                    .await?;
                uow.commit().await?;

                info!(
                    ledger_entry_id = ledger_entry_id,
                    client_id = client_id,
                    "Ledger entry cancelled"
                );
                Ok(entry)
            })
            .await
    }

    pub async fn list_receipts(&self, ledger_entry_id: &str) -> Result<Vec<Receipt>> {
        self.repository.list_receipts(ledger_entry_id).await
    }
}

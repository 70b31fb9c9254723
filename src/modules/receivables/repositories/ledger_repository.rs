// Ledger persistence
//
// Allocation runs inside a unit of work that holds row locks on the client's
// ledger entries from the first read until commit. Dropping a unit of work
// without committing rolls everything back.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::receivables::models::{AllocationPlan, LedgerEntry, LedgerStatus, Receipt};

/// Entry point to ledger storage
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Start a transactional unit of work
    async fn begin(&self) -> Result<Box<dyn LedgerUnitOfWork>>;

    /// Post a new ledger entry (invoice posting)
    async fn insert_entry(&self, entry: &LedgerEntry) -> Result<()>;

    /// Receipts recorded against an entry, oldest first
    async fn list_receipts(&self, ledger_entry_id: &str) -> Result<Vec<Receipt>>;
}

/// Operations that must share one transaction
#[async_trait]
pub trait LedgerUnitOfWork: Send {
    /// Open/partial entries of a client with outstanding > 0, locked for update
    async fn list_eligible_ledger_entries(&mut self, client_id: &str) -> Result<Vec<LedgerEntry>>;

    /// Single entry of a client, locked for update
    async fn find_entry_for_update(
        &mut self,
        client_id: &str,
        ledger_entry_id: &str,
    ) -> Result<Option<LedgerEntry>>;

    /// Write decremented entries and their receipts
    async fn persist_allocation(
        &mut self,
        plan: &AllocationPlan,
        updated_entries: &[LedgerEntry],
        receipts: &[Receipt],
    ) -> Result<()>;

    /// Write a status change (cancellation)
    async fn update_entry_status(&mut self, entry: &LedgerEntry) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;
}

pub struct MySqlLedgerRepository {
    pool: MySqlPool,
}

impl MySqlLedgerRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerRepository for MySqlLedgerRepository {
    async fn begin(&self) -> Result<Box<dyn LedgerUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlLedgerUnitOfWork { tx: Some(tx) }))
    }

    async fn insert_entry(&self, entry: &LedgerEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                id, client_id, ledger_date, total_amount, outstanding_amount,
                status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.client_id)
        .bind(entry.ledger_date)
        .bind(entry.total_amount)
        .bind(entry.outstanding_amount)
        .bind(entry.status.as_str())
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_receipts(&self, ledger_entry_id: &str) -> Result<Vec<Receipt>> {
        let rows = sqlx::query_as::<_, ReceiptRow>(
            r#"
            SELECT id, ledger_entry_id, client_id, amount, receipt_date, method, created_at
            FROM receipts
            WHERE ledger_entry_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(ledger_entry_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| row.try_into()).collect()
    }
}

pub struct MySqlLedgerUnitOfWork {
    tx: Option<Transaction<'static, MySql>>,
}

impl MySqlLedgerUnitOfWork {
    fn tx(&mut self) -> Result<&mut Transaction<'static, MySql>> {
        self.tx
            .as_mut()
            .ok_or_else(|| AppError::internal("Ledger unit of work already committed"))
    }
}

#[async_trait]
impl LedgerUnitOfWork for MySqlLedgerUnitOfWork {
    async fn list_eligible_ledger_entries(&mut self, client_id: &str) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(
            r#"
            SELECT id, client_id, ledger_date, total_amount, outstanding_amount,
                   status, created_at, updated_at
            FROM ledger_entries
            WHERE client_id = ?
              AND status IN ('open', 'partial')
              AND outstanding_amount > 0
            ORDER BY ledger_date ASC, id ASC
            FOR UPDATE
            "#,
        )
        .bind(client_id)
        .fetch_all(&mut **self.tx()?)
        .await?;

        rows.into_iter().map(|row| row.try_into()).collect()
    }

    async fn find_entry_for_update(
        &mut self,
        client_id: &str,
        ledger_entry_id: &str,
    ) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query_as::<_, LedgerEntryRow>(
            r#"
            SELECT id, client_id, ledger_date, total_amount, outstanding_amount,
                   status, created_at, updated_at
            FROM ledger_entries
            WHERE id = ? AND client_id = ?
            FOR UPDATE
            "#,
        )
        .bind(ledger_entry_id)
        .bind(client_id)
        .fetch_optional(&mut **self.tx()?)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into()?)),
            None => Ok(None),
        }
    }

    async fn persist_allocation(
        &mut self,
        plan: &AllocationPlan,
        updated_entries: &[LedgerEntry],
        receipts: &[Receipt],
    ) -> Result<()> {
        let tx = self.tx()?;

        for entry in updated_entries {
            let applied = plan.applied_to(&entry.id).ok_or_else(|| {
                AppError::internal(format!("Entry {} is not part of the plan", entry.id))
            })?;

            // Guard on the balance we read; a mismatch means the lock was not held
            let rows_affected = sqlx::query(
                r#"
                UPDATE ledger_entries
                SET outstanding_amount = ?, status = ?, updated_at = ?
                WHERE id = ? AND outstanding_amount = ?
                "#,
            )
            .bind(entry.outstanding_amount)
            .bind(entry.status.as_str())
            .bind(entry.updated_at)
            .bind(&entry.id)
            .bind(entry.outstanding_amount + applied)
            .execute(&mut **tx)
            .await?
            .rows_affected();

            if rows_affected == 0 {
                return Err(AppError::conflict(format!(
                    "Ledger entry {} changed during allocation",
                    entry.id
                )));
            }
        }

        for receipt in receipts {
            sqlx::query(
                r#"
                INSERT INTO receipts (
                    id, ledger_entry_id, client_id, amount, receipt_date, method, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&receipt.id)
            .bind(&receipt.ledger_entry_id)
            .bind(&receipt.client_id)
            .bind(receipt.amount)
            .bind(receipt.date)
            .bind(receipt.method.as_str())
            .bind(receipt.created_at)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn update_entry_status(&mut self, entry: &LedgerEntry) -> Result<()> {
        let rows_affected = sqlx::query(
            "UPDATE ledger_entries SET status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(entry.status.as_str())
        .bind(entry.updated_at)
        .bind(&entry.id)
        .execute(&mut **self.tx()?)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found(format!("Ledger entry {}", entry.id)));
        }

        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::internal("Ledger unit of work already committed"))?;
        tx.commit().await?;
        Ok(())
    }
}

/// Database row representation for ledger_entries table
#[derive(sqlx::FromRow)]
struct LedgerEntryRow {
    id: String,
    client_id: String,
    ledger_date: NaiveDate,
    total_amount: Decimal,
    outstanding_amount: Decimal,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<LedgerEntryRow> for LedgerEntry {
    type Error = AppError;

    fn try_from(row: LedgerEntryRow) -> Result<Self> {
        let status = LedgerStatus::try_from(row.status).map_err(AppError::Internal)?;

        Ok(LedgerEntry {
            id: row.id,
            client_id: row.client_id,
            ledger_date: row.ledger_date,
            total_amount: row.total_amount,
            outstanding_amount: row.outstanding_amount,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row representation for receipts table
#[derive(sqlx::FromRow)]
struct ReceiptRow {
    id: String,
    ledger_entry_id: String,
    client_id: String,
    amount: Decimal,
    receipt_date: NaiveDate,
    method: String,
    created_at: NaiveDateTime,
}

impl TryFrom<ReceiptRow> for Receipt {
    type Error = AppError;

    fn try_from(row: ReceiptRow) -> Result<Self> {
        let method = row.method.try_into().map_err(AppError::Internal)?;

        Ok(Receipt {
            id: row.id,
            ledger_entry_id: row.ledger_entry_id,
            client_id: row.client_id,
            amount: row.amount,
            date: row.receipt_date,
            method,
            created_at: row.created_at,
        })
    }
}

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{money, AppError, Result};

/// A client's receivable record, posted when an order's invoice is issued.
///
/// Append-only: fully paid entries stay with `outstanding_amount = 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub client_id: String,
    pub ledger_date: NaiveDate,
    pub total_amount: Decimal,
    /// 0 <= outstanding_amount <= total_amount
    pub outstanding_amount: Decimal,
    pub status: LedgerStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Ledger entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    /// Nothing paid yet
    Open,
    /// Some but not all paid
    Partial,
    /// Outstanding reached zero
    Paid,
    /// Order cancelled; never eligible for allocation
    Cancelled,
}

impl LedgerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for LedgerStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "open" => Ok(Self::Open),
            "partial" => Ok(Self::Partial),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid ledger status: {}", value)),
        }
    }
}

impl LedgerEntry {
    /// Post a new, fully outstanding ledger entry
    pub fn new(client_id: String, ledger_date: NaiveDate, total_amount: Decimal) -> Result<Self> {
        if client_id.trim().is_empty() {
            return Err(AppError::validation("Client id cannot be empty"));
        }

        if total_amount <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Ledger total must be positive, got: {}",
                total_amount
            )));
        }
        money::validate_scale("Ledger total", total_amount).map_err(AppError::Validation)?;

        let now = chrono::Utc::now().naive_utc();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            client_id,
            ledger_date,
            total_amount,
            outstanding_amount: total_amount,
            status: LedgerStatus::Open,
            created_at: now,
            updated_at: now,
        })
    }

    /// Open or partial with something left to pay
    pub fn is_eligible(&self) -> bool {
        matches!(self.status, LedgerStatus::Open | LedgerStatus::Partial)
            && self.outstanding_amount > Decimal::ZERO
    }

    /// Decrement the outstanding balance by a payment application
    pub fn apply_payment(&mut self, amount: Decimal) -> Result<()> {
        if !self.is_eligible() {
            return Err(AppError::validation(format!(
                "Ledger entry {} is {} and cannot receive payments",
                self.id, self.status
            )));
        }

        if amount <= Decimal::ZERO {
            return Err(AppError::validation("Applied amount must be positive"));
        }

        if amount > self.outstanding_amount {
            return Err(AppError::OverAllocation {
                requested: amount,
                available: self.outstanding_amount,
            });
        }

        self.outstanding_amount -= amount;
        self.status = if self.outstanding_amount.is_zero() {
            LedgerStatus::Paid
        } else {
            LedgerStatus::Partial
        };
        self.updated_at = chrono::Utc::now().naive_utc();

        Ok(())
    }

    /// Cancel the entry (order cancellation).
    ///
    /// Entries that already received money cannot be cancelled; that needs a
    /// reversing receipt first.
    pub fn cancel(&mut self) -> Result<()> {
        match self.status {
            LedgerStatus::Cancelled => {
                return Err(AppError::validation(format!(
                    "Ledger entry {} is already cancelled",
                    self.id
                )))
            }
            LedgerStatus::Partial | LedgerStatus::Paid => {
                return Err(AppError::validation(format!(
                    "Ledger entry {} has received payments and cannot be cancelled",
                    self.id
                )))
            }
            LedgerStatus::Open => {}
        }

        self.status = LedgerStatus::Cancelled;
        self.updated_at = chrono::Utc::now().naive_utc();
        Ok(())
    }
}

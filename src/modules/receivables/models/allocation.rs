use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{LedgerEntry, Receipt};

/// One slice of a payment placed on one ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub ledger_entry_id: String,
    pub applied_amount: Decimal,
}

/// Ordered (oldest debt first) split of a payment; lines sum to `payment_amount`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub client_id: String,
    pub payment_amount: Decimal,
    pub lines: Vec<AllocationLine>,
}

impl AllocationPlan {
    pub fn allocated_total(&self) -> Decimal {
        self.lines.iter().map(|l| l.applied_amount).sum()
    }

    pub fn applied_to(&self, ledger_entry_id: &str) -> Option<Decimal> {
        self.lines
            .iter()
            .find(|l| l.ledger_entry_id == ledger_entry_id)
            .map(|l| l.applied_amount)
    }
}

/// What a committed allocation changed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationResult {
    pub plan: AllocationPlan,
    /// Entries after decrement, in plan order
    pub updated_entries: Vec<LedgerEntry>,
    /// One per plan line, in plan order
    pub receipts: Vec<Receipt>,
}

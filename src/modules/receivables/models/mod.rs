pub mod allocation;
pub mod ledger_entry;
pub mod receipt;

pub use allocation::{AllocationLine, AllocationPlan, AllocationResult};
pub use ledger_entry::{LedgerEntry, LedgerStatus};
pub use receipt::{PaymentMethod, Receipt};

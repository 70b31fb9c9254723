pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{AllocationPlan, AllocationResult, LedgerEntry, LedgerStatus, PaymentMethod, Receipt};
pub use repositories::{LedgerRepository, LedgerUnitOfWork, MySqlLedgerRepository};
pub use services::{FifoAllocator, PaymentRequest, ReceivableService};

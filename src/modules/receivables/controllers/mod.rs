pub mod receivable_controller;

pub use receivable_controller::{
    allocate_payment, cancel_ledger_entry, configure, list_receipts, post_ledger_entry,
    preview_allocation, AllocationResponse, LedgerEntryResponse, ReceiptResponse,
};

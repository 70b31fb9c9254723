pub mod fifo_allocator;
pub mod receivable_service;

pub use fifo_allocator::FifoAllocator;
pub use receivable_service::{PaymentRequest, ReceivableService};

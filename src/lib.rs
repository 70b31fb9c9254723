//! Order financial computation engine
//!
//! Turns order inputs into money: tiered line prices, same-day combined
//! shipping with refunds and carry-over, and oldest-first allocation of
//! client payments against outstanding receivables.

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use modules::orders;
pub use modules::pricing;
pub use modules::receivables;
pub use modules::shipping;

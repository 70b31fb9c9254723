pub mod error;
pub mod money;
pub mod retry;
pub mod timezone;

pub use error::{AppError, Result};
pub use retry::RetryPolicy;
pub use timezone::BusinessCalendar;

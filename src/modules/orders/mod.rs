pub mod controllers;
pub mod models;
pub mod services;

pub use models::{OrderDraft, OrderLineItem, OrderQuote, QuotedLine};
pub use services::OrderPricingService;

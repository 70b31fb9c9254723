pub mod order_draft;

pub use order_draft::{OrderDraft, OrderLineItem, OrderQuote, QuotedLine};

pub mod order_controller;

pub use order_controller::{
    configure, price_order, OrderQuoteResponse, PriceOrderRequest, QuotedLineResponse,
};

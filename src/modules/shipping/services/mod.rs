pub mod shipping_aggregator;
pub mod shipping_service;

pub use shipping_aggregator::{ShippingAggregator, ShippingOutcome, ShippingRule};
pub use shipping_service::ShippingService;

pub mod order_pricing_service;

pub use order_pricing_service::OrderPricingService;

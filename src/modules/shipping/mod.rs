pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{DailyShippingAccumulator, ShippingFact, ShippingProfile, ShippingType};
pub use repositories::{
    AccumulatorRepository, AccumulatorUnitOfWork, MySqlShippingRepository,
    ShippingProfileRepository,
};
pub use services::{ShippingAggregator, ShippingOutcome, ShippingRule, ShippingService};

pub mod daily_accumulator;
pub mod shipping_profile;

pub use daily_accumulator::DailyShippingAccumulator;
pub use shipping_profile::{ShippingFact, ShippingProfile, ShippingType};

pub mod shipping_repository;

pub use shipping_repository::{
    AccumulatorRepository, AccumulatorUnitOfWork, MySqlShippingRepository,
    ShippingProfileRepository,
};

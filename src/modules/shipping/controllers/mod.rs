pub mod shipping_controller;

pub use shipping_controller::{
    configure, get_today, put_shipping_profile, record_adjustment, AccumulatorResponse,
    ShippingAdjustmentRequest, ShippingProfileRequest,
};

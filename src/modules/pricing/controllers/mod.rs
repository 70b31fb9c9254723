pub mod pricing_controller;

pub use pricing_controller::{
    configure, preview_line_price, put_price_profile, LinePriceRequest, LinePriceResponse,
};

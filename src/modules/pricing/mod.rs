pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{DiscountTier, OptionSelection, PriceProfile};
pub use repositories::{CatalogRepository, MySqlCatalogRepository};
pub use services::{LinePrice, PriceCalculator};

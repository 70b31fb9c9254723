pub mod price_profile;

pub use price_profile::{
    DiscountTier, OptionSelection, OptionSurcharge, PriceProfile, SpecificationSurcharge,
};

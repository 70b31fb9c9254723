// Price profile of a sellable unit (product or half-product)
//
// Lists are kept in their stored order: surcharge lookups and discount tier
// selection are first-match, so order is part of the pricing contract.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{money, AppError, Result};

/// Priced configuration of a sellable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceProfile {
    /// Product or half-product identifier
    #[serde(default)]
    pub sellable_id: String,
    pub base_price: Decimal,
    #[serde(default)]
    pub specification_surcharges: Vec<SpecificationSurcharge>,
    #[serde(default)]
    pub option_surcharges: Vec<OptionSurcharge>,
    #[serde(default)]
    pub discount_tiers: Vec<DiscountTier>,
}

/// Additive price for choosing a specification (size, paper, binding, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationSurcharge {
    pub specification_id: String,
    pub price: Decimal,
}

/// Additive price for one value of an option; values without a price are free
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSurcharge {
    pub option_id: String,
    pub value_name: String,
    pub price: Option<Decimal>,
}

/// Quantity break. `max_quantity: None` means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountTier {
    pub min_quantity: i64,
    pub max_quantity: Option<i64>,
    /// Multiplier applied to the unit price, in (0, 1]
    pub discount_rate: Decimal,
}

/// A client's choice for one option of a line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSelection {
    pub option_id: String,
    pub value: String,
}

impl OptionSelection {
    pub fn new(option_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            option_id: option_id.into(),
            value: value.into(),
        }
    }
}

impl DiscountTier {
    pub fn new(min_quantity: i64, max_quantity: Option<i64>, discount_rate: Decimal) -> Self {
        Self {
            min_quantity,
            max_quantity,
            discount_rate,
        }
    }

    pub fn matches(&self, quantity: i64) -> bool {
        quantity >= self.min_quantity && self.max_quantity.map_or(true, |max| quantity <= max)
    }

    fn overlaps(&self, other: &DiscountTier) -> bool {
        let self_max = self.max_quantity.unwrap_or(i64::MAX);
        let other_max = other.max_quantity.unwrap_or(i64::MAX);
        self.min_quantity <= other_max && other.min_quantity <= self_max
    }
}

impl PriceProfile {
    pub fn new(sellable_id: impl Into<String>, base_price: Decimal) -> Self {
        Self {
            sellable_id: sellable_id.into(),
            base_price,
            specification_surcharges: Vec::new(),
            option_surcharges: Vec::new(),
            discount_tiers: Vec::new(),
        }
    }

    pub fn with_specification(mut self, specification_id: impl Into<String>, price: Decimal) -> Self {
        self.specification_surcharges.push(SpecificationSurcharge {
            specification_id: specification_id.into(),
            price,
        });
        self
    }

    pub fn with_option(
        mut self,
        option_id: impl Into<String>,
        value_name: impl Into<String>,
        price: Option<Decimal>,
    ) -> Self {
        self.option_surcharges.push(OptionSurcharge {
            option_id: option_id.into(),
            value_name: value_name.into(),
            price,
        });
        self
    }

    pub fn with_tier(mut self, tier: DiscountTier) -> Self {
        self.discount_tiers.push(tier);
        self
    }

    /// Surcharge for a specification id, if the catalog knows it
    pub fn specification_surcharge(&self, specification_id: &str) -> Option<Decimal> {
        self.specification_surcharges
            .iter()
            .find(|s| s.specification_id == specification_id)
            .map(|s| s.price)
    }

    /// Surcharge for an option/value pair; `None` when unmatched or unpriced
    pub fn option_surcharge(&self, selection: &OptionSelection) -> Option<Decimal> {
        self.option_surcharges
            .iter()
            .find(|o| o.option_id == selection.option_id && o.value_name == selection.value)
            .and_then(|o| o.price)
    }

    /// Catalog-save validation.
    ///
    /// Not called at pricing time; a stored profile is priced as-is.
    /// Rejects negative prices, amounts with more than 4 decimal places,
    /// inverted or out-of-range tiers and tiers whose quantity ranges overlap.
    pub fn validate(&self) -> Result<()> {
        if self.sellable_id.trim().is_empty() {
            return Err(AppError::validation("Sellable id cannot be empty"));
        }

        if self.base_price < Decimal::ZERO {
            return Err(AppError::invalid_price_profile(format!(
                "Base price must be non-negative, got: {}",
                self.base_price
            )));
        }

        if let Some(s) = self
            .specification_surcharges
            .iter()
            .find(|s| s.price < Decimal::ZERO)
        {
            return Err(AppError::invalid_price_profile(format!(
                "Specification '{}' has negative surcharge {}",
                s.specification_id, s.price
            )));
        }

        let stored_prices = std::iter::once(("Base price".to_string(), self.base_price))
            .chain(self.specification_surcharges.iter().map(|s| {
                (format!("Specification '{}' surcharge", s.specification_id), s.price)
            }))
            .chain(self.option_surcharges.iter().filter_map(|o| {
                o.price.map(|price| {
                    (format!("Option '{}={}' surcharge", o.option_id, o.value_name), price)
                })
            }))
            .chain(
                self.discount_tiers
                    .iter()
                    .map(|t| (format!("Discount rate from {}", t.min_quantity), t.discount_rate)),
            );

        for (field, amount) in stored_prices {
            money::validate_scale(&field, amount).map_err(AppError::InvalidPriceProfile)?;
        }

        for tier in &self.discount_tiers {
            if tier.min_quantity < 1 {
                return Err(AppError::invalid_price_profile(format!(
                    "Discount tier minimum quantity must be at least 1, got: {}",
                    tier.min_quantity
                )));
            }

            if let Some(max) = tier.max_quantity {
                if max < tier.min_quantity {
                    return Err(AppError::invalid_price_profile(format!(
                        "Discount tier max quantity {} is below min quantity {}",
                        max, tier.min_quantity
                    )));
                }
            }

            if tier.discount_rate <= Decimal::ZERO || tier.discount_rate > Decimal::ONE {
                return Err(AppError::invalid_price_profile(format!(
                    "Discount rate must be in (0, 1], got: {}",
                    tier.discount_rate
                )));
            }
        }

        for (i, a) in self.discount_tiers.iter().enumerate() {
            for b in &self.discount_tiers[i + 1..] {
                if a.overlaps(b) {
                    return Err(AppError::invalid_price_profile(format!(
                        "Discount tiers {}..{} and {}..{} overlap",
                        a.min_quantity,
                        a.max_quantity.map_or("".to_string(), |m| m.to_string()),
                        b.min_quantity,
                        b.max_quantity.map_or("".to_string(), |m| m.to_string()),
                    )));
                }
            }
        }

        Ok(())
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{money, AppError, Result};
use crate::modules::pricing::models::{DiscountTier, OptionSelection, PriceProfile};

/// Result of pricing one line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePrice {
    /// The profile's base price, before any surcharge
    pub base_price: Decimal,
    /// Base price plus specification and option surcharges, before discount
    pub list_price: Decimal,
    pub discount_rate: Decimal,
    /// list_price × discount_rate
    pub unit_price: Decimal,
    /// unit_price × quantity
    pub total_price: Decimal,
}

/// Tiered price calculator for order line items.
///
/// Pure and stateless. Values are left unrounded; display rounding belongs to
/// the caller.
pub struct PriceCalculator;

impl PriceCalculator {
    /// Price one line item.
    ///
    /// Unknown specification ids and unmatched option selections are ignored:
    /// catalogs may lag behind what the ordering UI offers.
    ///
    /// # Errors
    /// * `InvalidQuantity` - quantity is zero or negative, or the line total overflows
    /// * `InvalidPriceProfile` - negative base price, negative resulting unit price
    ///   or a unit price that does not fit a decimal
    pub fn compute_line_price(
        profile: &PriceProfile,
        quantity: i64,
        specification_id: Option<&str>,
        option_selections: &[OptionSelection],
    ) -> Result<LinePrice> {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(quantity));
        }

        if profile.base_price < Decimal::ZERO {
            return Err(AppError::invalid_price_profile(format!(
                "Base price of '{}' is negative: {}",
                profile.sellable_id, profile.base_price
            )));
        }

        let mut price = profile.base_price;

        if let Some(spec_id) = specification_id {
            match profile.specification_surcharge(spec_id) {
                Some(surcharge) => price = Self::add_surcharge(profile, price, surcharge)?,
                None => debug!(
                    sellable_id = profile.sellable_id.as_str(),
                    specification_id = spec_id,
                    "Unknown specification ignored"
                ),
            }
        }

        for selection in option_selections {
            if let Some(surcharge) = profile.option_surcharge(selection) {
                price = Self::add_surcharge(profile, price, surcharge)?;
            }
        }

        let discount_rate = Self::select_discount_rate(&profile.discount_tiers, quantity);
        let unit_price = price.checked_mul(discount_rate).ok_or_else(|| {
            AppError::invalid_price_profile(format!(
                "Unit price of '{}' overflows: {} x {}",
                profile.sellable_id, price, discount_rate
            ))
        })?;

        if unit_price < Decimal::ZERO {
            return Err(AppError::invalid_price_profile(format!(
                "Unit price of '{}' is negative: {}",
                profile.sellable_id, unit_price
            )));
        }

        let total_price = unit_price
            .checked_mul(Decimal::from(quantity))
            .ok_or(AppError::InvalidQuantity(quantity))?;

        Ok(LinePrice {
            base_price: profile.base_price,
            list_price: price,
            discount_rate,
            unit_price,
            total_price,
        })
    }

    fn add_surcharge(profile: &PriceProfile, price: Decimal, surcharge: Decimal) -> Result<Decimal> {
        price.checked_add(surcharge).ok_or_else(|| {
            AppError::invalid_price_profile(format!(
                "List price of '{}' overflows adding surcharge {}",
                profile.sellable_id, surcharge
            ))
        })
    }

    /// First tier (in stored order) whose range contains `quantity`, else 1.
    /// First-match, not best-match.
    pub fn select_discount_rate(tiers: &[DiscountTier], quantity: i64) -> Decimal {
        tiers
            .iter()
            .find(|tier| tier.matches(quantity))
            .map(|tier| tier.discount_rate)
            .unwrap_or(Decimal::ONE)
    }

    /// Order subtotal: sum of line totals
    ///
    /// # Errors
    /// * `Validation` - the sum does not fit a decimal
    pub fn subtotal<'a>(lines: impl IntoIterator<Item = &'a LinePrice>) -> Result<Decimal> {
        money::checked_sum(lines.into_iter().map(|l| l.total_price))
            .ok_or_else(|| AppError::validation("Order subtotal overflows"))
    }
}

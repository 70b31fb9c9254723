use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{money, AppError, Result};
use crate::modules::shipping::models::{
    DailyShippingAccumulator, ShippingFact, ShippingProfile, ShippingType,
};

/// Which shipping rule priced an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingRule {
    /// Today's running subtotal reached the free-shipping threshold
    CombinedFreeShipping,
    /// Conditional client, several lines below threshold: one fee for the batch
    BatchSingleShipment,
    /// Each line pays its own fee
    PerLine,
}

impl ShippingRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CombinedFreeShipping => "combined_free_shipping",
            Self::BatchSingleShipment => "batch_single_shipment",
            Self::PerLine => "per_line",
        }
    }
}

/// Shipping outcome for one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingOutcome {
    pub rule: ShippingRule,
    /// Charged fee per line, same order as the input facts
    pub line_fees: Vec<Decimal>,
    pub net_shipping_fee: Decimal,
    /// Signed amount added to what the client owes; negative is a credit
    pub adjustment_amount: Decimal,
    pub updated_accumulator: DailyShippingAccumulator,
}

/// Shipping fee aggregator.
///
/// Rules in priority order, first applicable wins:
/// 1. combined free shipping (today's subtotal incl. this order >= threshold)
/// 2. batch single shipment (conditional client, >= 2 lines, below threshold)
/// 3. per-line fees
///
/// Direct-to-customer lines always pay their own fee.
pub struct ShippingAggregator;

impl ShippingAggregator {
    /// Compute the order's shipping and the accumulator to persist.
    ///
    /// A missing profile falls back to per-line fees; it never blocks an order.
    ///
    /// # Errors
    /// * `InvalidShippingProfile` - negative threshold or line fee, or one with
    ///   more than 4 decimal places
    /// * `Validation` - subtotal beyond 8 decimal places, or running totals that
    ///   do not fit a decimal
    pub fn compute_shipping(
        subtotal: Decimal,
        facts: &[ShippingFact],
        profile: Option<&ShippingProfile>,
        today: &DailyShippingAccumulator,
    ) -> Result<ShippingOutcome> {
        if let Some(profile) = profile {
            profile.validate()?;
        }

        money::validate_scale_within("Order subtotal", subtotal, money::SUBTOTAL_SCALE)
            .map_err(AppError::Validation)?;

        for (i, fact) in facts.iter().enumerate() {
            if fact.fee < Decimal::ZERO {
                return Err(AppError::invalid_shipping_profile(format!(
                    "Line {} has negative shipping fee {}",
                    i + 1,
                    fact.fee
                )));
            }
            money::validate_scale(&format!("Line {} shipping fee", i + 1), fact.fee)
                .map_err(AppError::InvalidShippingProfile)?;
        }

        let rule = Self::select_rule(subtotal, facts, profile, today)?;
        let line_fees = Self::line_fees(rule, facts);
        let net_shipping_fee = money::checked_sum(line_fees.iter().copied())
            .ok_or_else(|| AppError::validation("Net shipping fee overflows"))?;

        let mut updated = today.clone();
        let mut adjustment_amount = Decimal::ZERO;

        if rule == ShippingRule::CombinedFreeShipping && !updated.free_shipping_refunded {
            if updated.cumulative_shipping_charged > Decimal::ZERO {
                adjustment_amount = -updated.cumulative_shipping_charged;
                debug!(
                    client_id = updated.client_id.as_str(),
                    refund = %updated.cumulative_shipping_charged,
                    "Refunding earlier shipping, threshold crossed"
                );
                updated.cumulative_shipping_charged = Decimal::ZERO;
            }
            updated.free_shipping_refunded = true;
        }

        // Carried-over correction from an earlier order or manual adjustment
        adjustment_amount = adjustment_amount
            .checked_sub(updated.pending_adjustment_amount)
            .ok_or_else(|| AppError::validation("Shipping adjustment overflows"))?;
        updated.pending_adjustment_amount = Decimal::ZERO;

        let refundable = money::checked_sum(
            facts
                .iter()
                .zip(&line_fees)
                .filter(|(fact, _)| !fact.direct_to_customer)
                .map(|(_, fee)| *fee),
        )
        .ok_or_else(|| AppError::validation("Refundable shipping overflows"))?;

        updated.cumulative_subtotal = updated
            .cumulative_subtotal
            .checked_add(subtotal)
            .ok_or_else(|| AppError::validation("Daily subtotal overflows"))?;
        updated.cumulative_shipping_charged = updated
            .cumulative_shipping_charged
            .checked_add(refundable)
            .ok_or_else(|| AppError::validation("Daily shipping charged overflows"))?;
        updated.touch();

        Ok(ShippingOutcome {
            rule,
            line_fees,
            net_shipping_fee,
            adjustment_amount,
            updated_accumulator: updated,
        })
    }

    fn select_rule(
        subtotal: Decimal,
        facts: &[ShippingFact],
        profile: Option<&ShippingProfile>,
        today: &DailyShippingAccumulator,
    ) -> Result<ShippingRule> {
        let Some(profile) = profile else {
            return Ok(ShippingRule::PerLine);
        };

        let combined_total = today
            .cumulative_subtotal
            .checked_add(subtotal)
            .ok_or_else(|| AppError::validation("Daily subtotal overflows"))?;
        if combined_total >= profile.free_shipping_threshold {
            return Ok(ShippingRule::CombinedFreeShipping);
        }

        if profile.shipping_type == ShippingType::Conditional
            && facts.len() >= 2
            && subtotal < profile.free_shipping_threshold
        {
            return Ok(ShippingRule::BatchSingleShipment);
        }

        Ok(ShippingRule::PerLine)
    }

    fn line_fees(rule: ShippingRule, facts: &[ShippingFact]) -> Vec<Decimal> {
        match rule {
            ShippingRule::CombinedFreeShipping => facts
                .iter()
                .map(|f| if f.direct_to_customer { f.fee } else { Decimal::ZERO })
                .collect(),
            ShippingRule::BatchSingleShipment => {
                let mut charged_batch = false;
                facts
                    .iter()
                    .map(|f| {
                        if f.direct_to_customer {
                            f.fee
                        } else if !charged_batch {
                            charged_batch = true;
                            f.fee
                        } else {
                            Decimal::ZERO
                        }
                    })
                    .collect()
            }
            ShippingRule::PerLine => facts.iter().map(|f| f.fee).collect(),
        }
    }
}

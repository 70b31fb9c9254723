// Order pricing orchestration
//
// Lines are priced first and any failure aborts the whole order before
// shipping touches the daily accumulator. Shipping then runs in its own
// locked transaction and is retried from scratch on conflict.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::core::{money, AppError, Result};
use crate::modules::orders::models::{OrderDraft, OrderQuote, QuotedLine};
use crate::modules::pricing::{CatalogRepository, LinePrice, PriceCalculator, PriceProfile};
use crate::modules::shipping::ShippingService;

pub struct OrderPricingService {
    catalog: Arc<dyn CatalogRepository>,
    shipping: Arc<ShippingService>,
}

impl OrderPricingService {
    pub fn new(catalog: Arc<dyn CatalogRepository>, shipping: Arc<ShippingService>) -> Self {
        Self { catalog, shipping }
    }

    /// Price every line, then settle shipping against today's accumulator.
    ///
    /// # Errors
    /// * `Validation` - empty order, or totals that do not fit a decimal
    /// * `NotFound` - unknown sellable id
    /// * `InvalidQuantity` / `InvalidPriceProfile` - any line fails to price
    /// * `InvalidShippingProfile` - negative threshold or line fee
    /// * `ConcurrencyConflict` - accumulator retry budget exhausted
    pub async fn price_order(&self, draft: &OrderDraft) -> Result<OrderQuote> {
        if draft.lines.is_empty() {
            return Err(AppError::validation("Order must contain at least one line"));
        }

        let prices = self.price_lines(draft).await?;
        let subtotal = PriceCalculator::subtotal(&prices)?;

        let outcome = self
            .shipping
            .apply_order_shipping(&draft.client_id, subtotal, &draft.shipping_facts())
            .await?;

        let lines: Vec<QuotedLine> = draft
            .lines
            .iter()
            .zip(prices)
            .zip(&outcome.line_fees)
            .map(|((line, price), fee)| QuotedLine {
                sellable_id: line.sellable_id.clone(),
                quantity: line.quantity,
                price,
                shipping_fee: *fee,
                direct_to_customer: line.shipping_fact.direct_to_customer,
            })
            .collect();

        let amount_due = money::checked_sum([
            subtotal,
            outcome.net_shipping_fee,
            outcome.adjustment_amount,
        ])
        .ok_or_else(|| AppError::validation("Order amount due overflows"))?;

        info!(
            client_id = draft.client_id.as_str(),
            lines = lines.len(),
            subtotal = %subtotal,
            net_shipping_fee = %outcome.net_shipping_fee,
            adjustment = %outcome.adjustment_amount,
            amount_due = %amount_due,
            "Order priced"
        );

        Ok(OrderQuote {
            client_id: draft.client_id.clone(),
            business_date: outcome.updated_accumulator.date,
            lines,
            subtotal,
            net_shipping_fee: outcome.net_shipping_fee,
            adjustment_amount: outcome.adjustment_amount,
            amount_due,
            shipping_rule: outcome.rule,
        })
    }

    async fn price_lines(&self, draft: &OrderDraft) -> Result<Vec<LinePrice>> {
        let mut profiles: HashMap<&str, PriceProfile> = HashMap::new();
        let mut prices = Vec::with_capacity(draft.lines.len());

        for line in &draft.lines {
            let id = line.sellable_id.as_str();
            if !profiles.contains_key(id) {
                let profile = self.catalog.get_price_profile(id).await?;
                profiles.insert(id, profile);
            }

            let profile = profiles
                .get(id)
                .ok_or_else(|| AppError::internal(format!("Price profile '{}' not cached", id)))?;

            prices.push(PriceCalculator::compute_line_price(
                profile,
                line.quantity,
                line.specification_id.as_deref(),
                &line.option_selections,
            )?);
        }

        Ok(prices)
    }
}

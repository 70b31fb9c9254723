// Shipping business logic
//
// Implements:
// - Order shipping against today's accumulator in one locked transaction
// - Pending adjustments carried into the client's next order of the day
// - Shipping profile maintenance

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::core::{money, AppError, BusinessCalendar, Result, RetryPolicy};
use crate::modules::shipping::{
    models::{DailyShippingAccumulator, ShippingFact, ShippingProfile},
    repositories::{AccumulatorRepository, ShippingProfileRepository},
    services::{ShippingAggregator, ShippingOutcome},
};

pub struct ShippingService {
    profiles: Arc<dyn ShippingProfileRepository>,
    accumulators: Arc<dyn AccumulatorRepository>,
    retry: RetryPolicy,
    calendar: BusinessCalendar,
}

impl ShippingService {
    pub fn new(
        profiles: Arc<dyn ShippingProfileRepository>,
        accumulators: Arc<dyn AccumulatorRepository>,
        retry: RetryPolicy,
        calendar: BusinessCalendar,
    ) -> Self {
        Self {
            profiles,
            accumulators,
            retry,
            calendar,
        }
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    /// Price the shipping of one order and fold it into today's accumulator.
    ///
    /// The accumulator row stays locked from read to commit, so concurrent
    /// orders of the same client serialize and the refund fires at most once.
    pub async fn apply_order_shipping(
        &self,
        client_id: &str,
        subtotal: Decimal,
        facts: &[ShippingFact],
    ) -> Result<ShippingOutcome> {
        let date = self.calendar.today();

        let outcome = self
            .retry
            .run("apply_order_shipping", move || {
                self.apply_order_shipping_once(client_id, date, subtotal, facts)
            })
            .await?;

        info!(
            client_id = client_id,
            business_date = %date,
            rule = outcome.rule.as_str(),
            net_shipping_fee = %outcome.net_shipping_fee,
            adjustment = %outcome.adjustment_amount,
            "Order shipping applied"
        );

        Ok(outcome)
    }

    async fn apply_order_shipping_once(
        &self,
        client_id: &str,
        date: NaiveDate,
        subtotal: Decimal,
        facts: &[ShippingFact],
    ) -> Result<ShippingOutcome> {
        let (mut uow, outcome) = self
            .retry
            .within_deadline("apply_order_shipping", async {
                let profile = self.profiles.get_shipping_profile(client_id).await?;
                if profile.is_none() {
                    warn!(client_id = client_id, "No shipping profile, charging per line");
                }

                let mut uow = self.accumulators.begin().await?;
                let today = uow.get_or_create_today_accumulator(client_id, date).await?;

                let outcome =
                    ShippingAggregator::compute_shipping(subtotal, facts, profile.as_ref(), &today)?;

                uow.persist_accumulator(&outcome.updated_accumulator).await?;
                Ok((uow, outcome))
            })
            .await?;

        uow.commit().await?;
        Ok(outcome)
    }

    /// Add a signed amount to today's carry-over.
    ///
    /// Positive credits the client on their next order today, negative charges them.
    pub async fn record_pending_adjustment(
        &self,
        client_id: &str,
        amount: Decimal,
    ) -> Result<DailyShippingAccumulator> {
        if amount.is_zero() {
            return Err(AppError::validation("Adjustment amount must not be zero"));
        }
        money::validate_scale("Adjustment amount", amount).map_err(AppError::Validation)?;

        let date = self.calendar.today();

        let accumulator = self
            .retry
            .run("record_pending_adjustment", move || async move {
                let (mut uow, today) = self
                    .retry
                    .within_deadline("record_pending_adjustment", async {
                        let mut uow = self.accumulators.begin().await?;
                        let mut today = uow.get_or_create_today_accumulator(client_id, date).await?;

                        today.pending_adjustment_amount = today
                            .pending_adjustment_amount
                            .checked_add(amount)
                            .ok_or_else(|| {
                                AppError::validation(format!(
                                    "Pending adjustment overflows after adding {}",
                                    amount
                                ))
                            })?;
                        today.touch();

                        uow.persist_accumulator(&today).await?;
                        Ok((uow, today))
                    })
                    .await?;

                uow.commit().await?;
                Ok(today)
            })
            .await?;

        info!(
            client_id = client_id,
            business_date = %date,
            amount = %amount,
            pending = %accumulator.pending_adjustment_amount,
            "Pending shipping adjustment recorded"
        );

        Ok(accumulator)
    }

    /// Today's running totals; an empty accumulator when nothing happened yet
    pub async fn today_accumulator(&self, client_id: &str) -> Result<DailyShippingAccumulator> {
        let date = self.calendar.today();
        Ok(self
            .accumulators
            .find_accumulator(client_id, date)
            .await?
            .unwrap_or_else(|| DailyShippingAccumulator::new(client_id, date)))
    }

    pub async fn save_shipping_profile(&self, profile: &ShippingProfile) -> Result<()> {
        profile.validate()?;
        self.profiles.save_shipping_profile(profile).await?;

        info!(
            client_id = profile.client_id.as_str(),
            shipping_type = %profile.shipping_type,
            threshold = %profile.free_shipping_threshold,
            "Shipping profile saved"
        );

        Ok(())
    }
}

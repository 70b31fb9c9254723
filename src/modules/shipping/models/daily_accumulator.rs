use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-client, per-business-day running totals used for combined shipping.
///
/// One row per client per day; a new day starts from a fresh row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyShippingAccumulator {
    pub client_id: String,
    pub date: NaiveDate,
    pub cumulative_subtotal: Decimal,
    /// Client-address shipping charged today that a later threshold crossing may refund
    pub cumulative_shipping_charged: Decimal,
    /// Signed carry-over: positive = credit owed to the client, negative = debt owed by the client
    pub pending_adjustment_amount: Decimal,
    /// The combined-shipping refund already fired today
    pub free_shipping_refunded: bool,
    pub updated_at: NaiveDateTime,
}

impl DailyShippingAccumulator {
    /// Empty accumulator for the first order of the day
    pub fn new(client_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            client_id: client_id.into(),
            date,
            cumulative_subtotal: Decimal::ZERO,
            cumulative_shipping_charged: Decimal::ZERO,
            pending_adjustment_amount: Decimal::ZERO,
            free_shipping_refunded: false,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}

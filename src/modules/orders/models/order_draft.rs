use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::modules::pricing::{LinePrice, OptionSelection};
use crate::modules::shipping::{ShippingFact, ShippingRule};

/// One line of an order being submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub sellable_id: String,
    pub quantity: i64,
    pub specification_id: Option<String>,
    #[serde(default)]
    pub option_selections: Vec<OptionSelection>,
    pub shipping_fact: ShippingFact,
}

/// Order input; never persisted here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub client_id: String,
    pub lines: Vec<OrderLineItem>,
}

impl OrderDraft {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            lines: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: OrderLineItem) -> Self {
        self.lines.push(line);
        self
    }

    pub fn shipping_facts(&self) -> Vec<ShippingFact> {
        self.lines.iter().map(|l| l.shipping_fact.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedLine {
    pub sellable_id: String,
    pub quantity: i64,
    pub price: LinePrice,
    pub shipping_fee: Decimal,
    pub direct_to_customer: bool,
}

/// Money side of a submitted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderQuote {
    pub client_id: String,
    pub business_date: NaiveDate,
    pub lines: Vec<QuotedLine>,
    pub subtotal: Decimal,
    pub net_shipping_fee: Decimal,
    /// Negative is a credit to the client
    pub adjustment_amount: Decimal,
    /// subtotal + net_shipping_fee + adjustment_amount
    pub amount_due: Decimal,
    pub shipping_rule: ShippingRule,
}

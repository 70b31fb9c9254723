use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{money, AppError, Result};

/// How a client's shipping is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingType {
    /// Free above the threshold; below it, one fee per order batch
    Conditional,
    /// Every line pays its own fee unless the daily threshold is crossed
    PerItem,
}

impl ShippingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conditional => "conditional",
            Self::PerItem => "per_item",
        }
    }
}

impl std::fmt::Display for ShippingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for ShippingType {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "conditional" => Ok(Self::Conditional),
            "per_item" => Ok(Self::PerItem),
            _ => Err(format!("Invalid shipping type: {}", value)),
        }
    }
}

/// A client's shipping terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingProfile {
    pub client_id: String,
    pub shipping_type: ShippingType,
    pub free_shipping_threshold: Decimal,
}

impl ShippingProfile {
    pub fn new(
        client_id: impl Into<String>,
        shipping_type: ShippingType,
        free_shipping_threshold: Decimal,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            shipping_type,
            free_shipping_threshold,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.free_shipping_threshold < Decimal::ZERO {
            return Err(AppError::invalid_shipping_profile(format!(
                "Free shipping threshold of client '{}' is negative: {}",
                self.client_id, self.free_shipping_threshold
            )));
        }
        money::validate_scale("Free shipping threshold", self.free_shipping_threshold)
            .map_err(AppError::InvalidShippingProfile)?;
        Ok(())
    }
}

/// Shipping facts of one order line, computed upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingFact {
    /// Drop-shipped to an address other than the client's own
    pub direct_to_customer: bool,
    /// Delivery fee if direct-to-customer, else the fee from the client's profile
    pub fee: Decimal,
}

impl ShippingFact {
    pub fn to_client(fee: Decimal) -> Self {
        Self {
            direct_to_customer: false,
            fee,
        }
    }

    pub fn direct(fee: Decimal) -> Self {
        Self {
            direct_to_customer: true,
            fee,
        }
    }
}

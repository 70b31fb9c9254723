use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable record of one payment application to one ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: String,
    pub ledger_entry_id: String,
    pub client_id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub created_at: NaiveDateTime,
}

/// How the client paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::Card => "card",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "cash" => Ok(Self::Cash),
            "bank_transfer" => Ok(Self::BankTransfer),
            "card" => Ok(Self::Card),
            "other" => Ok(Self::Other),
            _ => Err(format!("Invalid payment method: {}", value)),
        }
    }
}

impl Receipt {
    pub fn new(
        ledger_entry_id: String,
        client_id: String,
        amount: Decimal,
        date: NaiveDate,
        method: PaymentMethod,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ledger_entry_id,
            client_id,
            amount,
            date,
            method,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use rust_decimal::Decimal;

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// MySQL error numbers that mean "another writer holds the rows, start over"
const MYSQL_LOCK_WAIT_TIMEOUT: u16 = 1205;
const MYSQL_DEADLOCK: u16 = 1213;

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Line item quantity was zero or negative
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Catalog price data would produce a negative price
    #[error("Invalid price profile: {0}")]
    InvalidPriceProfile(String),

    /// Payment exceeds the outstanding balance of the selected ledger entries
    #[error("Payment of {requested} exceeds outstanding balance of {available}")]
    OverAllocation {
        requested: Decimal,
        available: Decimal,
    },

    /// Shipping profile or per-item fee is unusable
    #[error("Invalid shipping profile: {0}")]
    InvalidShippingProfile(String),

    /// Transaction could not be serialized; the whole operation may be retried
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Validation errors for request input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => AppError::ConcurrencyConflict(err.to_string()),
            sqlx::Error::Database(db) => {
                let number = db
                    .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                    .map(|e| e.number());
                match number {
                    Some(MYSQL_DEADLOCK) | Some(MYSQL_LOCK_WAIT_TIMEOUT) => {
                        AppError::ConcurrencyConflict(db.message().to_string())
                    }
                    _ => AppError::Database(err),
                }
            }
            _ => AppError::Database(err),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
                "kind": self.kind(),
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidPriceProfile(_) => StatusCode::BAD_REQUEST,
            AppError::OverAllocation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidShippingProfile(_) => StatusCode::BAD_REQUEST,
            AppError::ConcurrencyConflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn invalid_price_profile(msg: impl Into<String>) -> Self {
        AppError::InvalidPriceProfile(msg.into())
    }

    pub fn invalid_shipping_profile(msg: impl Into<String>) -> Self {
        AppError::InvalidShippingProfile(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::ConcurrencyConflict(msg.into())
    }

    /// Only serialization failures are worth running again
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ConcurrencyConflict(_))
    }

    /// Stable machine-readable error kind for API clients
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidQuantity(_) => "invalid_quantity",
            AppError::InvalidPriceProfile(_) => "invalid_price_profile",
            AppError::OverAllocation { .. } => "over_allocation",
            AppError::InvalidShippingProfile(_) => "invalid_shipping_profile",
            AppError::ConcurrencyConflict(_) => "concurrency_conflict",
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Database(_) => "database",
            AppError::Configuration(_) => "configuration",
            AppError::Json(_) => "json",
            AppError::Internal(_) => "internal",
        }
    }
}

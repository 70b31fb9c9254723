use crate::core::{AppError, BusinessCalendar, Result, RetryPolicy};
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// "pretty" or "json"
    pub log_format: String,
}

/// Knobs for the financial computation engine itself
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// UTC offset (hours) that defines the business day for daily shipping totals
    pub business_utc_offset_hours: i32,
    /// How many times a conflicting transaction is re-run before giving up
    pub conflict_max_retries: u32,
    pub conflict_retry_backoff_ms: u64,
    /// Upper bound for one transactional attempt
    pub transaction_timeout_ms: u64,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Ok(EngineConfig {
            business_utc_offset_hours: parse_var("BUSINESS_UTC_OFFSET_HOURS", "9")?,
            conflict_max_retries: parse_var("CONFLICT_MAX_RETRIES", "3")?,
            conflict_retry_backoff_ms: parse_var("CONFLICT_RETRY_BACKOFF_MS", "25")?,
            transaction_timeout_ms: parse_var("TRANSACTION_TIMEOUT_MS", "5000")?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.conflict_max_retries,
            Duration::from_millis(self.conflict_retry_backoff_ms),
            Duration::from_millis(self.transaction_timeout_ms),
        )
    }

    pub fn calendar(&self) -> Result<BusinessCalendar> {
        BusinessCalendar::from_offset_hours(self.business_utc_offset_hours)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            business_utc_offset_hours: 9,
            conflict_max_retries: 3,
            conflict_retry_backoff_ms: 25,
            transaction_timeout_ms: 5000,
        }
    }
}

/// Read an env var with a default, failing loudly on garbage
pub(crate) fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", name)))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            engine: EngineConfig::from_env()?,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.app.log_format.as_str(), "pretty" | "json") {
            return Err(AppError::Configuration(format!(
                "LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                self.app.log_format
            )));
        }

        if self.engine.transaction_timeout_ms == 0 {
            return Err(AppError::Configuration(
                "Transaction timeout must be greater than 0".to_string(),
            ));
        }

        if self.engine.conflict_max_retries > 10 {
            return Err(AppError::Configuration(
                "CONFLICT_MAX_RETRIES must be at most 10".to_string(),
            ));
        }

        self.engine.calendar()?;
        self.database.validate()?;

        Ok(())
    }
}

//! # Application Configuration
//!
//! Settings loaded once at startup and shared by every service.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`ELECTROTECH_*`)
//! 2. Defaults (this file)
//!
//! Configuration is read-only after startup; services hold it behind an `Arc`.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use electrotech_core::types::TaxRate;
use electrotech_core::validation::validate_tax_rate_bps;
use electrotech_core::{DEFAULT_MIN_PASSWORD_LENGTH, DEFAULT_TAX_RATE_BPS};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be used.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: String, value: String },
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Store name (printed on invoices)
    pub store_name: String,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// Sales tax in basis points, e.g. 1600 = 16%
    pub default_tax_rate_bps: u32,

    /// Minimum length for user passwords
    pub min_password_length: usize,

    /// Reorder threshold given to products created without one
    pub default_min_stock: i64,

    /// Maximum rows returned by a search
    pub search_limit: u32,
}

impl Default for AppConfig {
    /// Returns default configuration suitable for development.
    ///
    /// ## Default Values
    /// - Database: `<platform data dir>/electrotech.db`
    /// - Currency: USD ($)
    /// - Tax: 16%
    /// - Passwords: at least 8 characters
    fn default() -> Self {
        AppConfig {
            database_path: default_database_path(),
            store_name: "ElectroTech".to_string(),
            currency_code: "USD".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            default_tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            default_min_stock: 5,
            search_limit: 50,
        }
    }
}

impl AppConfig {
    /// Creates an AppConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `ELECTROTECH_DB_PATH`: database file
    /// - `ELECTROTECH_STORE_NAME`: store name
    /// - `ELECTROTECH_TAX_RATE`: tax rate in percent (e.g., "16")
    /// - `ELECTROTECH_CURRENCY_SYMBOL`: currency symbol
    /// - `ELECTROTECH_MIN_PASSWORD_LENGTH`: minimum password length
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`AppConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = lookup("ELECTROTECH_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(store_name) = lookup("ELECTROTECH_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Some(symbol) = lookup("ELECTROTECH_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(rate_str) = lookup("ELECTROTECH_TAX_RATE") {
            let invalid = || ConfigError::InvalidValue {
                var: "ELECTROTECH_TAX_RATE".to_string(),
                value: rate_str.clone(),
            };
            let rate = rate_str.trim().parse::<f64>().map_err(|_| invalid())?;
            if !rate.is_finite() || rate < 0.0 {
                return Err(invalid());
            }
            let bps = TaxRate::from_percentage(rate).bps();
            validate_tax_rate_bps(bps).map_err(|_| invalid())?;
            config.default_tax_rate_bps = bps;
        }

        if let Some(len_str) = lookup("ELECTROTECH_MIN_PASSWORD_LENGTH") {
            let len = len_str
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|len| (4..=128).contains(len))
                .ok_or_else(|| ConfigError::InvalidValue {
                    var: "ELECTROTECH_MIN_PASSWORD_LENGTH".to_string(),
                    value: len_str.clone(),
                })?;
            config.min_password_length = len;
        }

        Ok(config)
    }

    /// Configuration for tests: in-memory database, otherwise defaults.
    pub fn in_memory() -> Self {
        AppConfig {
            database_path: PathBuf::from(":memory:"),
            ..AppConfig::default()
        }
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.default_tax_rate_bps)
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use electrotech_service::AppConfig;
    ///
    /// let config = AppConfig::in_memory();
    /// assert_eq!(config.format_currency(1234), "$12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

/// Determines the database file path based on the platform.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.electrotech.inventory/electrotech.db`
/// - **Windows**: `%APPDATA%\electrotech\inventory\data\electrotech.db`
/// - **Linux**: `~/.local/share/inventory/electrotech.db`
///
/// Falls back to the working directory when no home directory is known.
fn default_database_path() -> PathBuf {
    ProjectDirs::from("com", "electrotech", "inventory")
        .map(|dirs| dirs.data_dir().join("electrotech.db"))
        .unwrap_or_else(|| PathBuf::from("electrotech.db"))
}

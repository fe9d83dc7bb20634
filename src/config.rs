//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs:
//! the simulated date range and file locations, the starting
//! parameters shared by the bitcoin and fiat accounts, and log output.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

use crate::types::CostBasisMethod;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub account: AccountConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    /// JSON object of `"YYYY-MM-DD": price` entries.
    pub prices_path: String,
    /// Where to write the JSON report. Skipped when unset.
    #[serde(default)]
    pub report_path: Option<String>,
}

/// Starting parameters for one account. Both simulated accounts are
/// built from the same `AccountConfig`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AccountConfig {
    pub initial_usd: Decimal,
    pub initial_btc: Decimal,
    /// Cost basis per BTC for `initial_btc`. Defaults to the first
    /// checkpoint price.
    #[serde(default)]
    pub initial_btc_unit_cost_usd: Option<Decimal>,
    pub biweekly_income_usd: Decimal,
    /// Only used by the fiat account.
    pub reserve_floor_usd: Decimal,
    pub bill_usd: Decimal,
    #[serde(default)]
    pub cost_basis_method: CostBasisMethod,
}

/// Log output settings. `RUST_LOG` overrides `filter`, and setting
/// `BTCFLOW_LOG_JSON` forces JSON output.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "btcflow=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter(), json: false }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject ranges and amounts the simulator cannot work with.
    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        if sim.end_date < sim.start_date {
            bail!("end_date {} is before start_date {}", sim.end_date, sim.start_date);
        }
        self.account.validate()
    }
}

impl AccountConfig {
    pub fn validate(&self) -> Result<()> {
        let amounts = [
            ("initial_usd", self.initial_usd),
            ("initial_btc", self.initial_btc),
            ("biweekly_income_usd", self.biweekly_income_usd),
            ("reserve_floor_usd", self.reserve_floor_usd),
            ("bill_usd", self.bill_usd),
        ];
        for (name, value) in amounts {
            if value < Decimal::ZERO {
                bail!("{name} must not be negative (got {value})");
            }
        }
        if let Some(cost) = self.initial_btc_unit_cost_usd {
            if cost <= Decimal::ZERO {
                bail!("initial_btc_unit_cost_usd must be positive (got {cost})");
            }
        }
        Ok(())
    }
}

//! Side-by-side run of the bitcoin- and fiat-denominated accounts.
//!
//! Both accounts start from the same configuration and see the same
//! prices; each owns its own simulator state. `compare` runs them one
//! after the other, `compare_concurrent` runs them on tokio's blocking
//! pool.

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::AccountConfig;
use crate::data::PriceSeries;
use crate::engine::account::AccountSimulator;
use crate::types::{SimError, SimulationReport};

/// Results of both accounts plus an end-of-run valuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bitcoin: SimulationReport,
    pub fiat: SimulationReport,
    /// Price used to mark both accounts, and the date it was taken from.
    pub valuation_date: NaiveDate,
    pub valuation_price_usd: Decimal,
    pub bitcoin_net_worth_usd: Decimal,
    pub fiat_net_worth_usd: Decimal,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{} @ ${:.2} ({}) | bitcoin=${:.2} fiat=${:.2} | advantage=${:.2}",
            self.start_date,
            self.end_date,
            self.valuation_price_usd,
            self.valuation_date,
            self.bitcoin_net_worth_usd,
            self.fiat_net_worth_usd,
            self.bitcoin_advantage_usd(),
        )
    }
}

impl Comparison {
    /// Assemble a comparison from two finished runs.
    ///
    /// Marks both accounts at the last price on or before `end`; fails if
    /// the series has nothing that early.
    pub fn from_reports(
        start: NaiveDate,
        end: NaiveDate,
        bitcoin: SimulationReport,
        fiat: SimulationReport,
        prices: &PriceSeries,
    ) -> Result<Self, SimError> {
        let (valuation_date, valuation_price_usd) = prices
            .latest_on_or_before(end)
            .ok_or(SimError::MissingPrice { date: end })?;

        Ok(Self {
            start_date: start,
            end_date: end,
            bitcoin_net_worth_usd: bitcoin.net_worth_usd(valuation_price_usd),
            fiat_net_worth_usd: fiat.net_worth_usd(valuation_price_usd),
            bitcoin,
            fiat,
            valuation_date,
            valuation_price_usd,
        })
    }

    /// How much more the bitcoin account is worth (negative if less).
    pub fn bitcoin_advantage_usd(&self) -> Decimal {
        self.bitcoin_net_worth_usd - self.fiat_net_worth_usd
    }
}

/// Run both accounts sequentially over `[start, end]`.
pub fn compare(
    cfg: &AccountConfig,
    start: NaiveDate,
    end: NaiveDate,
    prices: &PriceSeries,
) -> Result<Comparison, SimError> {
    let bitcoin = AccountSimulator::bitcoin(cfg).run(start, end, prices)?;
    let fiat = AccountSimulator::fiat(cfg).run(start, end, prices)?;

    let comparison = Comparison::from_reports(start, end, bitcoin, fiat, prices)?;
    log_comparison(&comparison);
    Ok(comparison)
}

/// Run both accounts at the same time, each on its own blocking thread.
///
/// Produces the same `Comparison` as [`compare`]. When both runs fail, the
/// bitcoin account's error is returned; simulation errors stay
/// downcastable to [`SimError`].
pub async fn compare_concurrent(
    cfg: &AccountConfig,
    start: NaiveDate,
    end: NaiveDate,
    prices: Arc<PriceSeries>,
) -> anyhow::Result<Comparison> {
    let bitcoin = spawn_run(AccountSimulator::bitcoin(cfg), start, end, &prices);
    let fiat = spawn_run(AccountSimulator::fiat(cfg), start, end, &prices);
    let (bitcoin, fiat) = tokio::try_join!(bitcoin, fiat).context("Simulation task panicked")?;

    let comparison = Comparison::from_reports(start, end, bitcoin?, fiat?, &prices)?;
    log_comparison(&comparison);
    Ok(comparison)
}

fn spawn_run(
    sim: AccountSimulator,
    start: NaiveDate,
    end: NaiveDate,
    prices: &Arc<PriceSeries>,
) -> JoinHandle<Result<SimulationReport, SimError>> {
    let prices = Arc::clone(prices);
    tokio::task::spawn_blocking(move || sim.run(start, end, prices.as_ref()))
}

fn log_comparison(comparison: &Comparison) {
    info!(
        valuation_price = format!("${:.2}", comparison.valuation_price_usd),
        bitcoin = format!("${:.2}", comparison.bitcoin_net_worth_usd),
        fiat = format!("${:.2}", comparison.fiat_net_worth_usd),
        advantage = format!("${:.2}", comparison.bitcoin_advantage_usd()),
        "Comparison complete"
    );
}

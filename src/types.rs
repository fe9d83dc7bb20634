//! Shared types for the BTCFLOW simulator.
//!
//! These types form the data model used across all modules: lots,
//! transaction events, yearly summaries, run reports and the domain
//! error enum. Engine and accounting modules depend on them without
//! depending on each other's internals.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Rule deciding which lots are matched against a disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostBasisMethod {
    /// Oldest-acquired lot first.
    Fifo,
    /// Newest-acquired lot first.
    Lifo,
    /// Highest unit price first, ties in acquisition order.
    #[default]
    Hifo,
}

impl CostBasisMethod {
    pub const ALL: &'static [CostBasisMethod] = &[
        CostBasisMethod::Fifo,
        CostBasisMethod::Lifo,
        CostBasisMethod::Hifo,
    ];
}

impl fmt::Display for CostBasisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostBasisMethod::Fifo => write!(f, "FIFO"),
            CostBasisMethod::Lifo => write!(f, "LIFO"),
            CostBasisMethod::Hifo => write!(f, "HIFO"),
        }
    }
}

/// Parse a cost-basis method name (case-insensitive).
impl std::str::FromStr for CostBasisMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fifo" => Ok(CostBasisMethod::Fifo),
            "lifo" => Ok(CostBasisMethod::Lifo),
            "hifo" => Ok(CostBasisMethod::Hifo),
            _ => Err(anyhow::anyhow!("Unknown cost basis method: {s}")),
        }
    }
}

/// What an account holds its wealth in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitOfAccount {
    /// Earns into bitcoin, sells bitcoin to pay bills.
    #[serde(rename = "btc")]
    Bitcoin,
    /// Earns and pays in USD, sweeps surplus above the reserve floor into bitcoin.
    Fiat,
}

impl fmt::Display for UnitOfAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitOfAccount::Bitcoin => write!(f, "bitcoin"),
            UnitOfAccount::Fiat => write!(f, "fiat"),
        }
    }
}

/// Transaction direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lots & transactions
// ---------------------------------------------------------------------------

/// A discrete acquisition of bitcoin at a specific unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub amount_btc: Decimal,
    pub unit_price_usd: Decimal,
}

impl Lot {
    pub fn new(amount_btc: Decimal, unit_price_usd: Decimal) -> Self {
        Self { amount_btc, unit_price_usd }
    }

    /// USD paid for the amount still held in this lot.
    pub fn cost_basis(&self) -> Decimal {
        self.amount_btc * self.unit_price_usd
    }
}

impl fmt::Display for Lot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BTC @ ${:.2}", self.amount_btc, self.unit_price_usd)
    }
}

/// One buy or sell, appended to an account's history in date order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub date: NaiveDate,
    pub amount_btc: Decimal,
    pub price_usd: Decimal,
    pub direction: Direction,
    /// Account bitcoin balance right after this event.
    pub resulting_btc_balance: Decimal,
}

impl fmt::Display for TransactionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} BTC @ ${:.2} (balance: {} BTC)",
            self.date, self.direction, self.amount_btc, self.price_usd, self.resulting_btc_balance,
        )
    }
}

impl TransactionEvent {
    /// USD value exchanged in this event.
    pub fn notional_usd(&self) -> Decimal {
        self.amount_btc * self.price_usd
    }
}

// ---------------------------------------------------------------------------
// Yearly summary
// ---------------------------------------------------------------------------

/// Per-calendar-year aggregate for one account.
///
/// `bitcoin_retained` always equals `bitcoin_accumulated - bitcoin_sold`;
/// mutate only through the `record_*` methods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlySummary {
    pub bitcoin_accumulated: Decimal,
    pub bitcoin_sold: Decimal,
    pub bitcoin_retained: Decimal,
    pub realized_gain_loss_usd: Decimal,
}

impl fmt::Display for YearlySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accumulated={} BTC sold={} BTC retained={} BTC realized=${:.2}",
            self.bitcoin_accumulated,
            self.bitcoin_sold,
            self.bitcoin_retained,
            self.realized_gain_loss_usd,
        )
    }
}

impl YearlySummary {
    pub fn record_accumulated(&mut self, amount_btc: Decimal) {
        self.bitcoin_accumulated += amount_btc;
        self.bitcoin_retained += amount_btc;
    }

    pub fn record_sold(&mut self, amount_btc: Decimal, realized_gain_loss_usd: Decimal) {
        self.bitcoin_sold += amount_btc;
        self.bitcoin_retained -= amount_btc;
        self.realized_gain_loss_usd += realized_gain_loss_usd;
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Everything a single account run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub unit_of_account: UnitOfAccount,
    pub cost_basis_method: CostBasisMethod,
    pub yearly_summaries: BTreeMap<i32, YearlySummary>,
    pub transactions: Vec<TransactionEvent>,
    pub final_usd_balance: Decimal,
    pub final_bitcoin_balance: Decimal,
    /// Bitcoin the account started with (`initial_btc`). It is not part of
    /// any year's `bitcoin_accumulated`.
    pub opening_btc: Decimal,
    /// Lots still held at the end of the run, in acquisition order.
    pub open_lots: Vec<Lot>,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} / {}] usd=${:.2} btc={} | years={} txs={} | realized=${:.2}",
            self.unit_of_account,
            self.cost_basis_method,
            self.final_usd_balance,
            self.final_bitcoin_balance,
            self.yearly_summaries.len(),
            self.transactions.len(),
            self.total_realized_gain_loss(),
        )
    }
}

impl SimulationReport {
    /// Realized gain/loss summed across all years.
    pub fn total_realized_gain_loss(&self) -> Decimal {
        self.yearly_summaries.values().map(|s| s.realized_gain_loss_usd).sum()
    }

    /// Total bitcoin bought during the run. Excludes `opening_btc`, so
    /// `final_bitcoin_balance + total_sold() == opening_btc + total_accumulated()`.
    pub fn total_accumulated(&self) -> Decimal {
        self.yearly_summaries.values().map(|s| s.bitcoin_accumulated).sum()
    }

    /// Total bitcoin sold during the run.
    pub fn total_sold(&self) -> Decimal {
        self.yearly_summaries.values().map(|s| s.bitcoin_sold).sum()
    }

    /// USD value of the account if bitcoin is marked at `price_usd`.
    pub fn net_worth_usd(&self, price_usd: Decimal) -> Decimal {
        self.final_usd_balance + self.final_bitcoin_balance * price_usd
    }

    /// Unrealized gain/loss on the open lots at `price_usd`.
    pub fn unrealized_gain_loss(&self, price_usd: Decimal) -> Decimal {
        self.open_lots
            .iter()
            .map(|lot| (price_usd - lot.unit_price_usd) * lot.amount_btc)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain errors. Every variant aborts the current run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("missing price data for {date}")]
    MissingPrice { date: NaiveDate },

    #[error("invalid price {price_usd} on {date} (must be positive)")]
    InvalidPrice { date: NaiveDate, price_usd: Decimal },

    #[error("insufficient bitcoin to pay bill on {date}")]
    InsufficientBitcoin { date: NaiveDate },

    #[error("insufficient fiat to pay bill on {date}")]
    InsufficientFiat { date: NaiveDate },

    #[error("lot ledger inconsistency: asked to dispose {requested} BTC, only {available} BTC held")]
    LotShortfall { requested: Decimal, available: Decimal },

    #[error("invalid lot: amount {amount_btc} BTC @ ${price_usd} (both must be positive)")]
    InvalidLot { amount_btc: Decimal, price_usd: Decimal },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

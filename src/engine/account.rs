//! Account simulator — one account's balances, lots and history.
//!
//! Drives a private [`LotLedger`] through a [`Schedule`] of income and
//! bill checkpoints. A bitcoin-denominated account converts all income
//! to bitcoin and sells bitcoin for bills; a fiat-denominated account
//! pays bills in USD and sweeps anything above its reserve floor into
//! bitcoin after each income.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};

use crate::accounting::lots::LotLedger;
use crate::accounting::summary::YearlySummaries;
use crate::config::AccountConfig;
use crate::data::PriceSource;
use crate::engine::schedule::{Checkpoint, Phase, Schedule};
use crate::types::{
    CostBasisMethod, Direction, SimError, SimulationReport, TransactionEvent, UnitOfAccount,
};

/// Bitcoin amounts are kept in whole satoshis.
pub const BTC_DECIMALS: u32 = 8;

// ---------------------------------------------------------------------------
// Account simulator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AccountSimulator {
    unit: UnitOfAccount,
    usd_balance: Decimal,
    bitcoin_balance: Decimal,
    opening_btc: Decimal,
    reserve_floor_usd: Decimal,
    income_usd: Decimal,
    bill_usd: Decimal,
    method: CostBasisMethod,
    /// Unit cost for the opening lot; `None` means first checkpoint price.
    opening_unit_cost: Option<Decimal>,
    opened: bool,
    ledger: LotLedger,
    transactions: Vec<TransactionEvent>,
    summaries: YearlySummaries,
}

impl AccountSimulator {
    pub fn new(unit: UnitOfAccount, cfg: &AccountConfig) -> Self {
        let reserve_floor_usd = match unit {
            UnitOfAccount::Bitcoin => Decimal::ZERO,
            UnitOfAccount::Fiat => cfg.reserve_floor_usd,
        };
        Self {
            unit,
            usd_balance: cfg.initial_usd,
            bitcoin_balance: cfg.initial_btc,
            opening_btc: cfg.initial_btc,
            reserve_floor_usd,
            income_usd: cfg.biweekly_income_usd,
            bill_usd: cfg.bill_usd,
            method: cfg.cost_basis_method,
            opening_unit_cost: cfg.initial_btc_unit_cost_usd,
            opened: false,
            ledger: LotLedger::new(),
            transactions: Vec::new(),
            summaries: YearlySummaries::new(),
        }
    }

    /// Account that holds its wealth in bitcoin.
    pub fn bitcoin(cfg: &AccountConfig) -> Self {
        Self::new(UnitOfAccount::Bitcoin, cfg)
    }

    /// Account that holds its wealth in USD.
    pub fn fiat(cfg: &AccountConfig) -> Self {
        Self::new(UnitOfAccount::Fiat, cfg)
    }

    /// Walk every checkpoint in `[start, end]` and return the final report.
    ///
    /// Stops at the first failing checkpoint.
    pub fn run<P>(mut self, start: NaiveDate, end: NaiveDate, prices: &P) -> Result<SimulationReport, SimError>
    where
        P: PriceSource + ?Sized,
    {
        info!(account = %self.unit, method = %self.method, %start, %end, "Simulation starting");

        for checkpoint in Schedule::new(start, end) {
            let price = prices
                .price_on(checkpoint.date)
                .ok_or(SimError::MissingPrice { date: checkpoint.date })?;
            if let Err(e) = self.step(checkpoint, price) {
                warn!(account = %self.unit, date = %checkpoint.date, error = %e, "Simulation aborted");
                return Err(e);
            }
        }

        let report = self.into_report();
        info!(
            account = %report.unit_of_account,
            usd = format!("${:.2}", report.final_usd_balance),
            btc = %report.final_bitcoin_balance,
            txs = report.transactions.len(),
            realized = format!("${:.2}", report.total_realized_gain_loss()),
            "Simulation complete"
        );
        Ok(report)
    }

    /// Apply one checkpoint at `price_usd`; returns the events it produced.
    ///
    /// A non-positive price fails with [`SimError::InvalidPrice`] before
    /// any state changes.
    pub fn step(&mut self, checkpoint: Checkpoint, price_usd: Decimal) -> Result<Vec<TransactionEvent>, SimError> {
        if price_usd <= Decimal::ZERO {
            return Err(SimError::InvalidPrice { date: checkpoint.date, price_usd });
        }
        self.open_position(price_usd)?;
        let before = self.transactions.len();

        match checkpoint.phase {
            Phase::Income => self.add_income(checkpoint.date, price_usd)?,
            Phase::Bill => self.pay_bills(checkpoint.date, price_usd)?,
        }

        debug!(
            account = %self.unit,
            date = %checkpoint.date,
            phase = %checkpoint.phase,
            price = %price_usd,
            usd = %self.usd_balance,
            btc = %self.bitcoin_balance,
            "Checkpoint applied"
        );
        Ok(self.transactions[before..].to_vec())
    }

    /// Seed the starting bitcoin as a lot so disposals can match against it.
    fn open_position(&mut self, price_usd: Decimal) -> Result<(), SimError> {
        if self.opened {
            return Ok(());
        }
        self.opened = true;
        if self.bitcoin_balance > Decimal::ZERO {
            let unit_cost = self.opening_unit_cost.unwrap_or(price_usd);
            self.ledger.acquire(self.bitcoin_balance, unit_cost)?;
        }
        Ok(())
    }

    // -- Event handlers --

    fn add_income(&mut self, date: NaiveDate, price_usd: Decimal) -> Result<(), SimError> {
        match self.unit {
            UnitOfAccount::Bitcoin => {
                // Any leftover USD is swept in with the income.
                let usd = self.usd_balance + self.income_usd;
                if usd > Decimal::ZERO {
                    self.usd_balance = Decimal::ZERO;
                    self.buy(date, usd, price_usd)?;
                }
            }
            UnitOfAccount::Fiat => {
                self.usd_balance += self.income_usd;
                self.buy_surplus(date, price_usd)?;
            }
        }
        Ok(())
    }

    fn pay_bills(&mut self, date: NaiveDate, price_usd: Decimal) -> Result<(), SimError> {
        if self.bill_usd <= Decimal::ZERO {
            return Ok(());
        }
        match self.unit {
            UnitOfAccount::Bitcoin => {
                // Round up so the bitcoin sold always covers the bill.
                let amount_btc = (self.bill_usd / price_usd)
                    .round_dp_with_strategy(BTC_DECIMALS, RoundingStrategy::AwayFromZero);
                if amount_btc > self.bitcoin_balance {
                    return Err(SimError::InsufficientBitcoin { date });
                }
                let realized = self.ledger.dispose(amount_btc, price_usd, self.method)?;
                self.bitcoin_balance -= amount_btc;
                self.summaries.record_sold(date.year(), amount_btc, realized);
                self.record(date, amount_btc, price_usd, Direction::Sell);
            }
            UnitOfAccount::Fiat => {
                if self.bill_usd > self.usd_balance {
                    return Err(SimError::InsufficientFiat { date });
                }
                self.usd_balance -= self.bill_usd;
            }
        }
        Ok(())
    }

    /// Convert whatever sits above the reserve floor into bitcoin.
    fn buy_surplus(&mut self, date: NaiveDate, price_usd: Decimal) -> Result<(), SimError> {
        let surplus = self.usd_balance - self.reserve_floor_usd;
        if surplus > Decimal::ZERO {
            self.usd_balance -= surplus;
            self.buy(date, surplus, price_usd)?;
        }
        Ok(())
    }

    /// Convert `usd` at `price_usd`. Fractions of a satoshi are not credited.
    fn buy(&mut self, date: NaiveDate, usd: Decimal, price_usd: Decimal) -> Result<(), SimError> {
        let amount_btc = (usd / price_usd).round_dp_with_strategy(BTC_DECIMALS, RoundingStrategy::ToZero);
        if amount_btc.is_zero() {
            return Ok(());
        }
        self.ledger.acquire(amount_btc, price_usd)?;
        self.bitcoin_balance += amount_btc;
        self.summaries.record_accumulated(date.year(), amount_btc);
        self.record(date, amount_btc, price_usd, Direction::Buy);
        Ok(())
    }

    fn record(&mut self, date: NaiveDate, amount_btc: Decimal, price_usd: Decimal, direction: Direction) {
        self.transactions.push(TransactionEvent {
            date,
            amount_btc,
            price_usd,
            direction,
            resulting_btc_balance: self.bitcoin_balance,
        });
    }

    // -- Accessors --

    pub fn unit_of_account(&self) -> UnitOfAccount {
        self.unit
    }

    pub fn usd_balance(&self) -> Decimal {
        self.usd_balance
    }

    pub fn bitcoin_balance(&self) -> Decimal {
        self.bitcoin_balance
    }

    pub fn ledger(&self) -> &LotLedger {
        &self.ledger
    }

    pub fn transactions(&self) -> &[TransactionEvent] {
        &self.transactions
    }

    pub fn summaries(&self) -> &YearlySummaries {
        &self.summaries
    }

    pub fn into_report(self) -> SimulationReport {
        SimulationReport {
            unit_of_account: self.unit,
            cost_basis_method: self.method,
            open_lots: self.ledger.lots().to_vec(),
            yearly_summaries: self.summaries.into_map(),
            transactions: self.transactions,
            final_usd_balance: self.usd_balance,
            final_bitcoin_balance: self.bitcoin_balance,
            opening_btc: self.opening_btc,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Bitcoin price data.
//!
//! Defines the `PriceSource` trait the simulator reads checkpoint prices
//! through, and `PriceSeries`, the in-memory date→price map built from
//! an ISO-date keyed mapping.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// ISO calendar date format used for price keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Abstraction over a date→price lookup.
///
/// Implementors return the USD price of one bitcoin on an exact
/// calendar date, or `None` when that date has no data.
#[cfg_attr(test, mockall::automock)]
pub trait PriceSource: Send + Sync {
    fn price_on(&self, date: NaiveDate) -> Option<Decimal>;
}

/// Daily (or weekly) bitcoin closes keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceSeries {
    prices: BTreeMap<NaiveDate, Decimal>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from `"YYYY-MM-DD" -> price` pairs.
    ///
    /// Rejects malformed dates and non-positive prices.
    pub fn from_iso_map<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: AsRef<str>,
    {
        let mut series = Self::new();
        for (key, price) in entries {
            let key = key.as_ref();
            let date = NaiveDate::parse_from_str(key.trim(), DATE_FORMAT)
                .with_context(|| format!("Invalid price date: {key}"))?;
            series.insert(date, price)?;
        }
        Ok(series)
    }

    /// Build a series from already-parsed `(date, price)` pairs.
    pub fn from_prices<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, Decimal)>,
    {
        let mut series = Self::new();
        for (date, price) in entries {
            series.insert(date, price)?;
        }
        Ok(series)
    }

    /// Add or replace the price for `date`. Prices must be positive.
    pub fn insert(&mut self, date: NaiveDate, price_usd: Decimal) -> Result<()> {
        if price_usd <= Decimal::ZERO {
            bail!("Non-positive price {price_usd} for {date}");
        }
        self.prices.insert(date, price_usd);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// First and last dates covered.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.prices.keys().next()?;
        let last = self.prices.keys().next_back()?;
        Some((*first, *last))
    }

    /// Most recent price on or before `date`, for end-of-run valuation.
    pub fn latest_on_or_before(&self, date: NaiveDate) -> Option<(NaiveDate, Decimal)> {
        self.prices.range(..=date).next_back().map(|(d, p)| (*d, *p))
    }
}

impl PriceSource for PriceSeries {
    fn price_on(&self, date: NaiveDate) -> Option<Decimal> {
        self.prices.get(&date).copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Per-year aggregation of bitcoin flows and realized gains.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::types::YearlySummary;

/// Year-keyed summaries, created on first touch.
#[derive(Debug, Clone, Default)]
pub struct YearlySummaries {
    years: BTreeMap<i32, YearlySummary>,
}

impl YearlySummaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary for `year`, inserting an empty one if absent.
    pub fn entry(&mut self, year: i32) -> &mut YearlySummary {
        self.years.entry(year).or_default()
    }

    pub fn get(&self, year: i32) -> Option<&YearlySummary> {
        self.years.get(&year)
    }

    pub fn record_accumulated(&mut self, year: i32, amount_btc: Decimal) {
        self.entry(year).record_accumulated(amount_btc);
    }

    pub fn record_sold(&mut self, year: i32, amount_btc: Decimal, realized_gain_loss_usd: Decimal) {
        self.entry(year).record_sold(amount_btc, realized_gain_loss_usd);
    }

    /// Years in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&i32, &YearlySummary)> {
        self.years.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<i32, YearlySummary> {
        self.years
    }
}

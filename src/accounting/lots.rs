//! Lot ledger and cost-basis engine.
//!
//! Holds every bitcoin acquisition as a [`Lot`] and computes realized
//! gain/loss when bitcoin is disposed, matching lots in FIFO, LIFO or
//! HIFO order and splitting the last lot touched when the disposal is
//! smaller than it.

use rust_decimal::Decimal;
use tracing::debug;

use crate::types::{CostBasisMethod, Lot, SimError};

/// Ordered collection of open lots, oldest first.
#[derive(Debug, Clone, Default)]
pub struct LotLedger {
    lots: Vec<Lot>,
}

impl LotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new acquisition.
    pub fn acquire(&mut self, amount_btc: Decimal, unit_price_usd: Decimal) -> Result<(), SimError> {
        if amount_btc <= Decimal::ZERO || unit_price_usd <= Decimal::ZERO {
            return Err(SimError::InvalidLot { amount_btc, price_usd: unit_price_usd });
        }
        self.lots.push(Lot::new(amount_btc, unit_price_usd));
        debug!(amount = %amount_btc, price = %unit_price_usd, lots = self.lots.len(), "Lot acquired");
        Ok(())
    }

    /// Dispose of `amount_btc` at `disposal_price_usd` and return the
    /// realized gain (negative for a loss).
    ///
    /// Fails with [`SimError::LotShortfall`] if the ledger holds less than
    /// the requested amount; the ledger is left untouched in that case.
    pub fn dispose(
        &mut self,
        amount_btc: Decimal,
        disposal_price_usd: Decimal,
        method: CostBasisMethod,
    ) -> Result<Decimal, SimError> {
        if amount_btc <= Decimal::ZERO || disposal_price_usd <= Decimal::ZERO {
            return Err(SimError::InvalidLot { amount_btc, price_usd: disposal_price_usd });
        }
        let available = self.total_amount();
        if available < amount_btc {
            return Err(SimError::LotShortfall { requested: amount_btc, available });
        }

        let mut remaining = amount_btc;
        let mut realized = Decimal::ZERO;
        let mut emptied = Vec::new();

        for idx in self.disposal_order(method) {
            if remaining.is_zero() {
                break;
            }
            let lot = &mut self.lots[idx];
            let portion = lot.amount_btc.min(remaining);
            realized += (disposal_price_usd - lot.unit_price_usd) * portion;
            lot.amount_btc -= portion;
            remaining -= portion;
            if lot.amount_btc.is_zero() {
                emptied.push(idx);
            }
        }

        // Drop emptied lots highest index first so earlier indices stay valid.
        emptied.sort_unstable_by(|a, b| b.cmp(a));
        for idx in emptied {
            self.lots.remove(idx);
        }

        debug!(
            amount = %amount_btc,
            price = %disposal_price_usd,
            method = %method,
            realized = %realized,
            lots_left = self.lots.len(),
            "Lots disposed"
        );
        Ok(realized)
    }

    /// Indices into `lots` in the order `method` consumes them.
    fn disposal_order(&self, method: CostBasisMethod) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.lots.len()).collect();
        match method {
            CostBasisMethod::Fifo => {}
            CostBasisMethod::Lifo => order.reverse(),
            // `sort_by` is stable: equal prices keep acquisition order.
            CostBasisMethod::Hifo => order.sort_by(|&a, &b| {
                self.lots[b].unit_price_usd.cmp(&self.lots[a].unit_price_usd)
            }),
        }
        order
    }

    /// Total bitcoin across all open lots.
    pub fn total_amount(&self) -> Decimal {
        self.lots.iter().map(|l| l.amount_btc).sum()
    }

    /// Total USD cost of the bitcoin still held.
    pub fn total_cost_basis(&self) -> Decimal {
        self.lots.iter().map(Lot::cost_basis).sum()
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

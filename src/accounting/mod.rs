//! Tax-lot accounting: the lot ledger and per-year aggregation.

pub mod lots;
pub mod summary;

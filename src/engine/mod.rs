//! Simulation engine — the checkpoint schedule, per-account simulator
//! and the two-account comparison.

pub mod schedule;
pub mod account;
pub mod comparison;

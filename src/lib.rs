//! BTCFLOW — biweekly bitcoin vs fiat cash-flow simulator
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod data;
pub mod accounting;
pub mod engine;
pub mod storage;

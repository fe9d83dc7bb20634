//! File IO.
//!
//! Loads the bitcoin price mapping from a JSON file and writes run
//! reports as pretty JSON. Simulation state itself is never persisted.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::data::PriceSeries;

/// Load a `{"YYYY-MM-DD": price, ...}` JSON file into a price series.
pub fn load_prices(path: &str) -> Result<PriceSeries> {
    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read prices from {path}"))?;

    let raw: BTreeMap<String, Decimal> = serde_json::from_str(&json)
        .context(format!("Failed to parse prices from {path}"))?;

    let series = PriceSeries::from_iso_map(raw)
        .context(format!("Invalid price data in {path}"))?;

    info!(
        path,
        entries = series.len(),
        range = ?series.range(),
        "Prices loaded from disk"
    );
    Ok(series)
}

/// Save any serializable report to a JSON file.
pub fn save_report<T: Serialize>(report: &T, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialise report")?;

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create report directory for {path}"))?;
        }
    }

    std::fs::write(path, &json)
        .context(format!("Failed to write report to {path}"))?;

    debug!(path, bytes = json.len(), "Report saved");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

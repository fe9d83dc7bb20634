//! BTCFLOW — biweekly bitcoin vs fiat cash-flow simulator
//!
//! Entry point. Loads configuration and prices, initialises structured
//! logging, runs the bitcoin- and fiat-denominated accounts side by side
//! and writes the comparison report.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use btcflow::config::{self, LoggingConfig};
use btcflow::engine::comparison::compare_concurrent;
use btcflow::storage;
use btcflow::types::SimulationReport;

const DEFAULT_CONFIG: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = config::AppConfig::load(&config_path)?;
    init_logging(&cfg.logging);

    let sim = &cfg.simulation;
    info!(
        config = %config_path,
        start = %sim.start_date,
        end = %sim.end_date,
        method = %cfg.account.cost_basis_method,
        income = format!("${:.2}", cfg.account.biweekly_income_usd),
        bill = format!("${:.2}", cfg.account.bill_usd),
        "BTCFLOW starting up"
    );

    let prices = Arc::new(storage::load_prices(&sim.prices_path)?);

    let comparison = match compare_concurrent(&cfg.account, sim.start_date, sim.end_date, prices).await {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Simulation failed");
            return Err(e);
        }
    };

    log_yearly_table(&comparison.bitcoin);
    log_yearly_table(&comparison.fiat);

    if let Some(path) = &sim.report_path {
        storage::save_report(&comparison, path)?;
        info!(path = %path, "Report written");
    }

    Ok(())
}

/// Log one line per year of an account's summary.
fn log_yearly_table(report: &SimulationReport) {
    for (year, summary) in &report.yearly_summaries {
        info!(
            account = %report.unit_of_account,
            year,
            accumulated = %summary.bitcoin_accumulated,
            sold = %summary.bitcoin_sold,
            retained = %summary.bitcoin_retained,
            realized = format!("${:.2}", summary.realized_gain_loss_usd),
            "Yearly summary"
        );
    }
    info!(account = %report.unit_of_account, opening_btc = %report.opening_btc, "{report}");
}

/// Install the `tracing` subscriber described by `[logging]`.
///
/// Thread ids are included in JSON output so the two account runs can be
/// told apart.
fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let json = logging.json || std::env::var_os("BTCFLOW_LOG_JSON").is_some();

    let builder = fmt().with_env_filter(filter).with_target(true);
    if json {
        builder.json().with_thread_ids(true).init();
    } else {
        builder.init();
    }
}

//! Multi-month simulation runs.
//!
//! Replays generated weekly price series through both account types to
//! check the end-to-end numbers, yearly aggregation, conservation of
//! bitcoin and reproducibility of results.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use btcflow::config::{AccountConfig, AppConfig};
use btcflow::data::PriceSeries;
use btcflow::engine::account::AccountSimulator;
use btcflow::engine::comparison::compare;
use btcflow::types::{CostBasisMethod, Direction, SimError, SimulationReport};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn base_config() -> AccountConfig {
    AccountConfig {
        initial_usd: dec!(5000),
        initial_btc: Decimal::ZERO,
        initial_btc_unit_cost_usd: None,
        biweekly_income_usd: dec!(2100),
        reserve_floor_usd: dec!(3000),
        bill_usd: dec!(2000),
        cost_basis_method: CostBasisMethod::Hifo,
    }
}

/// Weekly prices starting at `start`, cycling through `pattern`.
fn weekly_prices(start: &str, weeks: i64, pattern: &[Decimal]) -> PriceSeries {
    let start = date(start);
    PriceSeries::from_prices(
        (0..weeks).map(|w| (start + Duration::days(7 * w), pattern[w as usize % pattern.len()])),
    )
    .unwrap()
}

fn assert_summaries_consistent(report: &SimulationReport) {
    for (year, s) in &report.yearly_summaries {
        assert_eq!(
            s.bitcoin_retained,
            s.bitcoin_accumulated - s.bitcoin_sold,
            "retained mismatch in {year}"
        );
        assert!(s.bitcoin_accumulated >= Decimal::ZERO);
        assert!(s.bitcoin_sold >= Decimal::ZERO);
    }
}

#[test]
fn test_three_checkpoint_example() {
    let prices = weekly_prices("2020-01-01", 3, &[dec!(10000)]);
    let report = AccountSimulator::bitcoin(&base_config())
        .run(date("2020-01-01"), date("2020-01-15"), &prices)
        .unwrap();

    let balances: Vec<_> = report.transactions.iter().map(|t| t.resulting_btc_balance).collect();
    assert_eq!(balances, vec![dec!(0.71), dec!(0.51), dec!(0.72)]);
    assert_eq!(report.transactions[1].direction, Direction::Sell);
    assert_eq!(report.total_realized_gain_loss(), Decimal::ZERO);
}

#[test]
fn test_multi_year_run_is_consistent() {
    let pattern = [dec!(8000), dec!(9500), dec!(12000), dec!(10000), dec!(15000), dec!(11000)];
    let prices = weekly_prices("2020-11-04", 20, &pattern);
    let start = date("2020-11-04");
    let end = start + Duration::days(7 * 19);

    for &method in CostBasisMethod::ALL {
        let cfg = AccountConfig { cost_basis_method: method, ..base_config() };
        let c = compare(&cfg, start, end, &prices).unwrap();

        for report in [&c.bitcoin, &c.fiat] {
            assert_summaries_consistent(report);
            assert_eq!(report.yearly_summaries.len(), 2, "{method}");

            // held + disposed == acquired
            let held: Decimal = report.open_lots.iter().map(|l| l.amount_btc).sum();
            assert_eq!(held, report.final_bitcoin_balance);
            assert_eq!(held + report.total_sold(), report.total_accumulated());
            assert_eq!(report.opening_btc, Decimal::ZERO);

            // History is in date order and each balance follows from the last.
            let mut balance = Decimal::ZERO;
            let mut last_date = start;
            for tx in &report.transactions {
                assert!(tx.date >= last_date);
                last_date = tx.date;
                match tx.direction {
                    Direction::Buy => balance += tx.amount_btc,
                    Direction::Sell => balance -= tx.amount_btc,
                }
                assert_eq!(tx.resulting_btc_balance, balance);
            }
        }

        // The fiat account never sells.
        assert_eq!(c.fiat.total_sold(), Decimal::ZERO);
        assert_eq!(c.fiat.total_realized_gain_loss(), Decimal::ZERO);
    }
}

#[test]
fn test_rerun_is_identical() {
    let pattern = [dec!(8000), dec!(9500), dec!(12000), dec!(7000)];
    let prices = weekly_prices("2021-03-03", 16, &pattern);
    let start = date("2021-03-03");
    let end = date("2021-06-16");

    let first = compare(&base_config(), start, end, &prices).unwrap();
    let second = compare(&base_config(), start, end, &prices).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_methods_differ_only_in_gains() {
    let pattern = [dec!(10000), dec!(30000), dec!(20000), dec!(25000)];
    let prices = weekly_prices("2020-01-01", 12, &pattern);
    let start = date("2020-01-01");
    let end = date("2020-03-18");
    let cfg = AccountConfig { initial_usd: dec!(20000), ..base_config() };

    let reports: Vec<_> = CostBasisMethod::ALL
        .iter()
        .map(|&m| {
            AccountSimulator::bitcoin(&AccountConfig { cost_basis_method: m, ..cfg.clone() })
                .run(start, end, &prices)
                .unwrap()
        })
        .collect();

    // Same flows, same balances...
    for r in &reports[1..] {
        assert_eq!(r.final_bitcoin_balance, reports[0].final_bitcoin_balance);
        assert_eq!(r.transactions, reports[0].transactions);
    }
    // ...but HIFO never realizes more gain than FIFO.
    let fifo = reports[0].total_realized_gain_loss();
    let hifo = reports[2].total_realized_gain_loss();
    assert!(hifo <= fifo, "hifo {hifo} > fifo {fifo}");
}

#[test]
fn test_missing_week_aborts_run() {
    // Week 3 (2020-01-22) has no close.
    let prices = PriceSeries::from_prices(
        [0, 1, 2, 4, 5]
            .into_iter()
            .map(|w| (date("2020-01-01") + Duration::days(7 * w), dec!(10000))),
    )
    .unwrap();

    let err = compare(&base_config(), date("2020-01-01"), date("2020-02-05"), &prices).unwrap_err();
    assert_eq!(err, SimError::MissingPrice { date: date("2020-01-22") });
    assert_eq!(err.to_string(), "missing price data for 2020-01-22");
}

#[test]
fn test_bitcoin_account_runs_dry() {
    // Income too small to cover bills.
    let cfg = AccountConfig {
        initial_usd: Decimal::ZERO,
        biweekly_income_usd: dec!(1000),
        ..base_config()
    };
    let prices = weekly_prices("2020-01-01", 4, &[dec!(10000)]);
    let err = AccountSimulator::bitcoin(&cfg)
        .run(date("2020-01-01"), date("2020-01-22"), &prices)
        .unwrap_err();
    assert_eq!(err.to_string(), "insufficient bitcoin to pay bill on 2020-01-08");
}

#[test]
fn test_config_drives_simulation() {
    let cfg = AppConfig::from_toml(
        r#"
[simulation]
start_date = "2020-01-01"
end_date = "2020-01-15"
prices_path = "unused.json"

[account]
initial_usd = 5000.0
initial_btc = 0.0
biweekly_income_usd = 2100.0
reserve_floor_usd = 3000.0
bill_usd = 2000.0
cost_basis_method = "lifo"
"#,
    )
    .unwrap();

    let prices = weekly_prices("2020-01-01", 3, &[dec!(10000)]);
    let report = AccountSimulator::bitcoin(&cfg.account)
        .run(cfg.simulation.start_date, cfg.simulation.end_date, &prices)
        .unwrap();
    assert_eq!(report.cost_basis_method, CostBasisMethod::Lifo);
    assert_eq!(report.final_bitcoin_balance, dec!(0.72));
}

#[test]
fn test_opening_bitcoin_balances_both_accounts() {
    let cfg = AccountConfig {
        initial_btc: dec!(0.3),
        initial_btc_unit_cost_usd: Some(dec!(7000)),
        ..base_config()
    };
    let pattern = [dec!(8000), dec!(9500), dec!(12000), dec!(7000)];
    let prices = weekly_prices("2020-01-01", 12, &pattern);
    let c = compare(&cfg, date("2020-01-01"), date("2020-03-18"), &prices).unwrap();

    for report in [&c.bitcoin, &c.fiat] {
        assert_eq!(report.opening_btc, dec!(0.3));
        let held: Decimal = report.open_lots.iter().map(|l| l.amount_btc).sum();
        assert_eq!(held, report.final_bitcoin_balance);
        assert_eq!(held + report.total_sold(), report.opening_btc + report.total_accumulated());
    }
}

//! Cost-basis engine through the public API.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use btcflow::accounting::lots::LotLedger;
use btcflow::types::{CostBasisMethod, SimError};

fn ledger(lots: &[(Decimal, Decimal)]) -> LotLedger {
    let mut ledger = LotLedger::new();
    for &(amount, price) in lots {
        ledger.acquire(amount, price).unwrap();
    }
    ledger
}

#[test]
fn test_three_lot_disposal_per_method() {
    let lots = [(dec!(1.0), dec!(10000)), (dec!(1.0), dec!(30000)), (dec!(1.0), dec!(20000))];
    let expected = [
        (CostBasisMethod::Fifo, dec!(12500)),
        (CostBasisMethod::Lifo, dec!(2500)),
        (CostBasisMethod::Hifo, dec!(-2500)),
    ];

    for (method, gain) in expected {
        let mut l = ledger(&lots);
        assert_eq!(l.dispose(dec!(1.5), dec!(25000), method).unwrap(), gain, "{method}");
        assert_eq!(l.total_amount(), dec!(1.5));
    }
}

#[test]
fn test_repeated_partial_disposals() {
    let mut l = ledger(&[(dec!(0.3), dec!(9000)), (dec!(0.2), dec!(11000))]);

    // FIFO: 0.1 + 0.1 + 0.1 drain the first lot, then 0.05 from the second
    let mut total = Decimal::ZERO;
    for _ in 0..3 {
        total += l.dispose(dec!(0.1), dec!(10000), CostBasisMethod::Fifo).unwrap();
    }
    assert_eq!(l.len(), 1);
    total += l.dispose(dec!(0.05), dec!(10000), CostBasisMethod::Fifo).unwrap();

    // 0.3 * 1000 - 0.05 * 1000
    assert_eq!(total, dec!(250));
    assert_eq!(l.total_amount(), dec!(0.15));
    assert_eq!(l.total_cost_basis(), dec!(1650));
}

#[test]
fn test_over_disposal_is_an_error() {
    let mut l = ledger(&[(dec!(0.5), dec!(9000))]);
    let err = l.dispose(dec!(0.50000001), dec!(10000), CostBasisMethod::Hifo).unwrap_err();
    assert!(matches!(err, SimError::LotShortfall { .. }));
    assert!(err.to_string().contains("lot ledger inconsistency"));
    assert_eq!(l.total_amount(), dec!(0.5));
}

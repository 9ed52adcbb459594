//! Replaying the same recorded graduations twice must produce bit-identical
//! results: fills, journal summary, final balance, exit histogram.

use martim::core::{
    adapter::PaperExecution,
    backtest::{parse_records, BacktestReport, BacktestRunner},
    clock::SimClock,
    strategy::Strategy,
};
use martim::execution::paper::PaperAdapter;
use martim::strategies::graduation_sniper::ExitCounts;
use martim::strategies::{GraduationSniper, SniperConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::{cell::RefCell, rc::Rc};

/// Deterministic synthetic input: a spread of winners, losers, timeouts and
/// one unreplayable record that must be skipped.
fn input_json() -> String {
    let mut records = Vec::new();
    for i in 0..50 {
        let graduated_at = 1_708_000_000 + i * 600;
        let base: i32 = 10_000 + i * 7;
        // price path depends on the record index: thirds go up, down, flat
        let path: Vec<String> = match i % 3 {
            0 => (1..=5)
                .map(|j| {
                    format!(
                        r#"{{"timestamp": {}, "price": {}e-9, "volume_5m": 1000}}"#,
                        graduated_at + j * 30,
                        base + j * 2000
                    )
                })
                .collect(),
            1 => (1..=5)
                .map(|j| {
                    format!(
                        r#"{{"timestamp": {}, "price": {}e-9, "volume_5m": 500}}"#,
                        graduated_at + j * 30,
                        base.saturating_sub(j * 900)
                    )
                })
                .collect(),
            _ => (1..=5)
                .map(|j| {
                    format!(
                        r#"{{"timestamp": {}, "price": {}e-9, "volume_5m": 100}}"#,
                        graduated_at + j * 30,
                        base + j % 2
                    )
                })
                .collect(),
        };
        records.push(format!(
            r#"{{
                "mint": "Mint{i}",
                "symbol": "TK{i}",
                "graduated_at": {graduated_at},
                "initial_price_usd": {base}e-9,
                "sol_raised": 85.0,
                "holder_count": {holders},
                "creator": "creator{i}",
                "pool_address": "pool{i}",
                "pool_type": "pumpswap",
                "price_history": [{path}]
            }}"#,
            holders = 100 + i,
            path = path.join(",")
        ));
    }
    // a record with no mint: skipped with a warning, replay continues
    records.push(r#"{ "symbol": "BROKEN", "graduated_at": 1708500000 }"#.to_owned());
    format!("[{}]", records.join(","))
}

fn run_once() -> (BacktestReport, ExitCounts) {
    let records = parse_records(&input_json()).unwrap();
    let clock = Rc::new(SimClock::default());
    let paper = Rc::new(PaperAdapter::new(dec!(1000), clock));
    let sniper = Rc::new(RefCell::new(GraduationSniper::new(SniperConfig {
        min_score: 50,
        max_positions: 5,
        max_hold_seconds: 120,
        ..Default::default()
    })));
    let as_strategy: Rc<RefCell<dyn Strategy>> = Rc::clone(&sniper) as _;

    let mut runner = BacktestRunner::new(
        as_strategy,
        Rc::clone(&paper) as Rc<dyn PaperExecution>,
        records,
    );
    let report = runner.run().unwrap();
    let exits = sniper.borrow().exit_counts();
    (report, exits)
}

#[test]
fn same_input_twice_is_bit_identical() {
    let (first, first_exits) = run_once();
    let (second, second_exits) = run_once();

    assert_eq!(first.trades_entered, second.trades_entered);
    assert_eq!(first.final_balance, second.final_balance);
    assert_eq!(first.total_pnl, second.total_pnl);
    assert_eq!(first.max_drawdown, second.max_drawdown);
    assert_eq!(first.summary, second.summary);
    assert_eq!(first_exits, second_exits);
}

#[test]
fn replay_trades_and_skips_bad_records() {
    let (report, exits) = run_once();

    assert_eq!(report.total_graduations, 50);
    assert_eq!(report.records_skipped, 1);
    // every third record rallies 2x+: take-profits must appear
    assert!(exits.take_profit > 0);
    // falling records lose > 20%: stop-losses must appear
    assert!(exits.stop_loss > 0);
    // flat records can only leave via the timeout
    assert!(exits.timeout > 0);
    assert!(report.trades_entered > 0);
    assert_eq!(report.round_trips as u32, exits.total());
    assert_eq!(report.initial_balance, dec!(1000));
    assert!(report.final_balance > Decimal::ZERO);
}

#[test]
fn journal_summary_is_consistent_with_exits() {
    let (report, exits) = run_once();

    assert_eq!(report.summary.trade_count, report.round_trips);
    assert_eq!(
        report.summary.win_count + report.summary.loss_count,
        report.summary.trade_count
    );
    // winners in the journal match the winning exit reasons
    assert_eq!(report.summary.win_count as u32, exits.wins());
}

// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Integration tests for the backtest driver.

use std::sync::{Arc, Mutex};

use anyhow::bail;
use gauntlet::{
    Account, Backtest, BacktestConfig, BacktestError, BacktestEvent, BarList, Broker, BrokerEvent,
    Decision, Position, Price, RunState, Strategy, Tick, TickSource,
};

fn trade(time: u32, cents: i64, size: u64) -> Tick {
    Tick::trade("TST", 20080509, time, Price(cents), size, "NYSE")
}

/// Long 100 on odd trade counts, flat on even ones; logs every tick seen.
#[derive(Default)]
struct Flipper {
    seen: Arc<Mutex<Vec<Tick>>>,
    count: i64,
}

impl Strategy for Flipper {
    fn name(&self) -> &str {
        "flipper"
    }

    fn indicator_names(&self) -> Vec<String> {
        vec!["count".into()]
    }

    fn evaluate(&mut self, tick: &Tick, _: &BarList, _: &Position) -> anyhow::Result<Decision> {
        self.seen.lock().unwrap().push(tick.clone());
        self.count += 1;
        let target = if self.count % 2 == 1 { 100 } else { 0 };
        Ok(Decision::target(target).with_indicators(vec![self.count as f64]))
    }
}

/// Fails on the nth tick.
struct Failing(usize);

impl Strategy for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn evaluate(&mut self, _: &Tick, _: &BarList, _: &Position) -> anyhow::Result<Decision> {
        if self.0 == 0 {
            bail!("indicator blew up");
        }
        self.0 -= 1;
        Ok(Decision::hold())
    }
}

fn config() -> BacktestConfig {
    BacktestConfig {
        name: "test".into(),
        ..BacktestConfig::default()
    }
}

fn backtest<S: Strategy + 'static>(
    strategy: S,
    sources: Vec<TickSource>,
    config: BacktestConfig,
) -> Backtest {
    let mut bt = Backtest::new(Broker::new());
    bt.configure(sources, strategy, config);
    bt
}

fn fixed_stream() -> Vec<Tick> {
    vec![trade(93000, 10_00, 100), trade(93100, 10_50, 100), trade(93200, 11_00, 100)]
}

// ============================================================================
// Replay semantics
// ============================================================================

#[test]
fn runs_are_deterministic() {
    let fills = || {
        let report = backtest(Flipper::default(), vec![TickSource::new("s", fixed_stream())], config())
            .start()
            .unwrap()
            .wait()
            .unwrap();
        (
            report.broker.trade_list().to_vec(),
            report.broker.order_list().to_vec(),
            report.indicators,
        )
    };
    let first = fills();
    assert_eq!(first, fills());
    assert_eq!(first.0.len(), 2);
    assert_eq!(first.2, vec![vec![1.0], vec![2.0], vec![3.0]]);
}

#[test]
fn orders_never_fill_on_the_tick_that_produced_them() {
    let report = backtest(Flipper::default(), vec![TickSource::new("s", fixed_stream())], config())
        .run()
        .unwrap();

    // tick 1 -> buy 100, filled on tick 2; tick 2 -> sell 100, filled on tick 3
    let trades = report.broker.trade_list();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].side, gauntlet::Side::Buy);
    assert_eq!(trades[0].execution().time, 93100);
    assert_eq!(trades[0].order().time, 93000);
    assert_eq!(trades[1].execution().time, 93200);
    assert_eq!(report.broker.closed_pl(Some("TST")), 100 * 50);

    // tick 3 -> buy 100, still pending
    let open = report.broker.order_list();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].comment, "flipper");
    assert_eq!(open[0].exchange, "NYSE");
}

#[test]
fn sources_replay_in_caller_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let strategy = Flipper {
        seen: Arc::clone(&seen),
        count: 0,
    };
    let late = TickSource::new("late", vec![trade(150000, 10_00, 1)]);
    let early = TickSource::new("early", vec![trade(93000, 10_00, 1), trade(93100, 10_00, 1)]);

    backtest(strategy, vec![late, early], config()).run().unwrap();

    let times: Vec<u32> = seen.lock().unwrap().iter().map(|t| t.time).collect();
    assert_eq!(times, vec![150000, 93000, 93100]);
}

#[test]
fn quotes_reach_broker_but_not_strategy() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let strategy = Flipper {
        seen: Arc::clone(&seen),
        count: 0,
    };
    let ticks = vec![
        trade(93000, 10_00, 100),
        Tick::bid("TST", 20080509, 93001, Price(9_99), 500),
        Tick::ask("TST", 20080509, 93002, Price(10_01), 500),
    ];

    let mut broker = Broker::new();
    let broker_ticks = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&broker_ticks);
    broker.subscribe(move |e| {
        if let BrokerEvent::Tick(_) = e {
            *sink.lock().unwrap() += 1;
        }
    });
    let mut bt = Backtest::new(broker);
    bt.configure(vec![TickSource::new("s", ticks)], strategy, config());
    let report = bt.run().unwrap();

    assert_eq!(*broker_ticks.lock().unwrap(), 3);
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(report.ticks_processed, 3);
    assert_eq!(report.fills, 0);
}

#[test]
fn exchange_filter_drops_other_venues() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let strategy = Flipper {
        seen: Arc::clone(&seen),
        count: 0,
    };
    let ticks = vec![
        trade(93000, 10_00, 100),
        trade(93100, 10_00, 100).on("ARCA"),
        trade(93200, 10_00, 100),
    ];
    let config = BacktestConfig {
        exchange_filter: "NYSE".into(),
        ..config()
    };

    let report = backtest(strategy, vec![TickSource::new("s", ticks)], config).run().unwrap();

    assert_eq!(report.ticks_processed, 2);
    assert!(seen.lock().unwrap().iter().all(|t| t.exchange == "NYSE"));
    // the ARCA print did not fill the order from 93000
    assert_eq!(report.broker.trade_list()[0].execution().time, 93200);
}

#[test]
fn trades_in_configured_account() {
    let config = BacktestConfig {
        account: "SIM".into(),
        ..config()
    };
    let report = backtest(Flipper::default(), vec![TickSource::new("s", fixed_stream())], config)
        .run()
        .unwrap();

    let sim = Account::with_id("SIM");
    assert_eq!(report.broker.trade_list_for(&sim).unwrap().len(), 2);
    assert!(report.broker.trade_list().is_empty());
    assert!(report.broker.order_list_for(&sim).unwrap()[0].account == "SIM");
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn progress_is_monotonic_and_ends_at_100() {
    let sources = vec![
        TickSource::new("a", (0..50).map(|i| trade(93000 + i, 10_00, 1)).collect::<Vec<_>>()),
        TickSource::new("b", (0..50).map(|i| trade(100000 + i, 10_00, 1)).collect::<Vec<_>>()),
    ];
    let config = BacktestConfig {
        progress_step: 10,
        ..config()
    };
    let handle = backtest(Flipper::default(), sources, config).start().unwrap();
    let report_state;
    let mut progress = Vec::new();
    loop {
        match handle.events().recv().unwrap() {
            BacktestEvent::Progress(p) => progress.push(p),
            BacktestEvent::Finished(state) => {
                report_state = state;
                break;
            }
        }
    }
    let report = handle.wait().unwrap();

    assert_eq!(report_state, RunState::Completed);
    assert_eq!(report.state, RunState::Completed);
    assert!(progress.windows(2).all(|w| w[0] < w[1]), "{progress:?}");
    assert!(progress.contains(&50));
    assert_eq!(progress.last(), Some(&100));
}

#[test]
fn unknown_length_sources_report_per_source() {
    let ticks = fixed_stream();
    let filtered = ticks.into_iter().filter(|t| t.is_trade);
    let handle = backtest(Flipper::default(), vec![TickSource::new("s", filtered)], config())
        .start()
        .unwrap();
    let events: Vec<BacktestEvent> = handle.events().iter().collect();
    handle.wait().unwrap();

    assert_eq!(
        events,
        vec![BacktestEvent::Progress(100), BacktestEvent::Finished(RunState::Completed)]
    );
}

#[test]
fn cancel_before_start_yields_cancelled_report() {
    let bt = backtest(Flipper::default(), vec![TickSource::new("s", fixed_stream())], config());
    bt.cancel();
    let handle = bt.start().unwrap();
    let events: Vec<BacktestEvent> = handle.events().iter().collect();
    let report = handle.wait().unwrap();

    assert_eq!(report.state, RunState::Cancelled);
    assert_eq!(report.ticks_processed, 0);
    assert_eq!(report.fills, 0);
    assert_eq!(events, vec![BacktestEvent::Finished(RunState::Cancelled)]);
}

#[test]
fn cancel_while_running_keeps_accumulated_state() {
    let (reached_tx, reached_rx) = std::sync::mpsc::channel::<()>();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    // the worker asks for the second tick only after finishing the first
    let ticks = fixed_stream().into_iter().enumerate().map(move |(i, t)| {
        if i == 1 {
            let _ = reached_tx.send(());
            let _ = release_rx.recv();
        }
        t
    });
    let handle = backtest(Flipper::default(), vec![TickSource::new("s", ticks)], config())
        .start()
        .unwrap();
    reached_rx.recv().unwrap();
    handle.cancel();
    release_tx.send(()).unwrap();
    let report = handle.wait().unwrap();

    assert_eq!(report.state, RunState::Cancelled);
    assert_eq!(report.ticks_processed, 1);
    assert_eq!(report.broker.order_list().len(), 1);
}

#[test]
fn strategy_error_faults_the_run() {
    let handle = backtest(Failing(1), vec![TickSource::new("s", fixed_stream())], config())
        .start()
        .unwrap();
    let events: Vec<BacktestEvent> = handle.events().iter().collect();
    let err = handle.wait().unwrap_err();

    assert_eq!(events.last(), Some(&BacktestEvent::Finished(RunState::Faulted)));
    match err {
        BacktestError::Strategy { name, symbol, cause } => {
            assert_eq!(name, "failing");
            assert_eq!(symbol.as_str(), "TST");
            assert_eq!(cause.to_string(), "indicator blew up");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn worker_panic_is_reported() {
    struct Panicky;
    impl Strategy for Panicky {
        fn name(&self) -> &str {
            "panicky"
        }
        fn evaluate(&mut self, _: &Tick, _: &BarList, _: &Position) -> anyhow::Result<Decision> {
            panic!("boom");
        }
    }
    let handle = backtest(Panicky, vec![TickSource::new("s", fixed_stream())], config())
        .start()
        .unwrap();
    assert!(matches!(handle.wait(), Err(BacktestError::WorkerPanicked)));
}

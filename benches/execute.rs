// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Throughput benchmarks for broker matching and tick replay.
//!
//! Measures:
//! - `execute` against a broker holding resting orders that do not fill
//! - `execute` filling market orders across several accounts
//! - a full backtest replay with a trivial strategy

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gauntlet::{
    Account, Backtest, BacktestConfig, BarList, Broker, Decision, Order, Position, Price, Side,
    Strategy, Tick, TickSource,
};

fn print(cents: i64, size: u64) -> Tick {
    Tick::trade("IBM", 20080509, 93500, Price(cents), size, "NYSE")
}

/// Broker with `n` buy limits far below the market, spread over 4 accounts.
fn build_broker(n: usize) -> Broker {
    let mut broker = Broker::new();
    let accounts: Vec<Account> = (0..4).map(|i| Account::with_id(format!("A{i}"))).collect();
    for i in 0..n {
        let order = Order::limit("IBM", Side::Buy, 100, Price(1_00 + (i % 50) as i64)).unwrap();
        broker.send_order_for(order, &accounts[i % accounts.len()]);
    }
    broker
}

/// Benchmark: trade tick that scans resting orders without filling
fn bench_execute_no_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute_no_fill");

    for n in [10, 100, 1000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut broker = build_broker(n);
            let tick = print(100_00, 1_000_000);
            b.iter(|| black_box(broker.execute(black_box(&tick))));
        });
    }

    group.finish();
}

/// Benchmark: market orders submitted then filled by one print
fn bench_execute_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute_fill");

    for n in [1, 10, 100] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut broker = Broker::new();
            let tick = print(100_00, 1_000_000);
            b.iter(|| {
                for _ in 0..n {
                    broker.send_order(Order::new("IBM", Side::Buy, 100).unwrap());
                }
                black_box(broker.execute(&tick));
                broker.reset();
            });
        });
    }

    group.finish();
}

struct Alternate(i64);

impl Strategy for Alternate {
    fn name(&self) -> &str {
        "alternate"
    }

    fn evaluate(&mut self, _: &Tick, _: &BarList, _: &Position) -> anyhow::Result<Decision> {
        self.0 = -self.0;
        Ok(Decision::target(self.0))
    }
}

/// Benchmark: full replay of a single-symbol tick stream
fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");

    for n in [1_000u32, 10_000] {
        let ticks: Vec<Tick> = (0..n)
            .map(|i| {
                let time = 93000 + (i / 60 % 60) * 100 + i % 60;
                Tick::trade("IBM", 20080509, time, Price(100_00 + (i % 7) as i64), 100, "NYSE")
            })
            .collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &ticks, |b, ticks| {
            b.iter(|| {
                let mut bt = Backtest::new(Broker::new());
                bt.configure(
                    vec![TickSource::new("IBM", ticks.clone())],
                    Alternate(100),
                    BacktestConfig::default(),
                );
                black_box(bt.run().unwrap().fills)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_execute_no_fill, bench_execute_fill, bench_replay);
criterion_main!(benches);

//! Criterion benchmarks for the simulation hot paths.
//!
//! Benchmarks:
//! 1. Chart alignment over a year of hourly candles
//! 2. Full simulation loop over ninety days of hourly candles

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tradesim_core::domain::{
    Chart, ChartElement, DataDependency, EngineSnapshot, Episode, ExitReason, Period,
    SessionParameters, CANDLES, ONE_HOUR_MS,
};
use tradesim_core::engine::{
    align_chart, AlignmentLayout, CollaboratorError, Collaborators, OutputSink, ProgressSink,
    Simulation, StartMode, StopToken, TradingEngine, TradingEpisode, TradingRecords,
    TradingSystem,
};

const H: i64 = ONE_HOUR_MS;

fn make_chart(n: i64) -> Chart {
    let mut chart = Chart::new();
    chart.insert_series(
        Period::Hours1,
        CANDLES,
        (0..n).map(|i| ChartElement::new(i * H, (i + 1) * H).with_value("close", 100.0)).collect(),
    );
    for period in [Period::Hours4, Period::Hours24] {
        let step = period.millis();
        let count = n * H / step;
        chart.insert_series(
            period,
            "emas",
            (0..count).map(|i| ChartElement::new(i * step, (i + 1) * step).with_value("ema", 1.0)).collect(),
        );
    }
    chart
}

fn dependencies() -> Vec<DataDependency> {
    vec![
        DataDependency::market("ema", "emas").at_period(Period::Hours4),
        DataDependency::market("ema", "emas").at_period(Period::Hours24),
    ]
}

struct Noop {
    episode: Episode,
}

impl TradingSystem for Noop {
    fn initialize(&mut self) -> Result<(), CollaboratorError> { Ok(()) }
    fn update_chart(&mut self, _chart: &Chart) {}
    fn maintain(&mut self, _s: &mut EngineSnapshot) -> Result<(), CollaboratorError> { Ok(()) }
    fn reset(&mut self) {}
    fn run(&mut self, _s: &mut EngineSnapshot) -> Result<(), CollaboratorError> { Ok(()) }
    fn finalize(&mut self) {}
}

impl TradingEpisode for Noop {
    fn initialize(&mut self) -> Result<(), CollaboratorError> { Ok(()) }
    fn open_episode(&mut self, _s: &EngineSnapshot) {}
    fn maintain(&mut self, _s: &EngineSnapshot) -> Result<(), CollaboratorError> { Ok(()) }
    fn reset(&mut self) {}
    fn update_exit_type(&mut self, reason: ExitReason) { self.episode.exit_type = Some(reason); }
    fn close_episode(&mut self, _s: &EngineSnapshot) {}
    fn finalize(&mut self) {}
    fn episode(&self) -> &Episode { &self.episode }
}

struct NoopEngine;

impl TradingEngine for NoopEngine {
    fn maintain(&mut self, _s: &mut EngineSnapshot) -> Result<(), CollaboratorError> { Ok(()) }
    fn reset(&mut self, _s: &mut EngineSnapshot) {}
}

struct NoopOutput;

impl TradingRecords for NoopOutput {
    fn initialize(&mut self, _o: &mut dyn OutputSink) -> Result<(), CollaboratorError> { Ok(()) }
    fn append_records(&mut self, _s: &EngineSnapshot, _e: &Episode, _o: &mut dyn OutputSink) -> Result<(), CollaboratorError> { Ok(()) }
    fn finalize(&mut self) {}
}

impl OutputSink for NoopOutput {
    fn append(&mut self, _d: &str, _r: serde_json::Value) -> Result<(), CollaboratorError> { Ok(()) }
    fn write_files(&mut self) -> Result<(), CollaboratorError> { Ok(()) }
}

impl ProgressSink for NoopOutput {
    fn heartbeat(&mut self, _t: &str, _p: f64) {}
    fn new_internal_loop(&mut self, _d: NaiveDate, _p: f64) {}
}

fn bench_align(c: &mut Criterion) {
    let mut chart = make_chart(24 * 365);
    let deps = dependencies();
    let layout = AlignmentLayout::default();
    c.bench_function("align_chart_1y_hourly", |b| {
        b.iter(|| align_chart(&mut chart, black_box(24 * 180 * H), &deps, &layout, false))
    });
}

fn bench_simulation(c: &mut Criterion) {
    let template = make_chart(24 * 90);
    c.bench_function("simulation_90d_hourly", |b| {
        b.iter(|| {
            let mut chart = template.clone();
            let mut system = Noop { episode: Episode::default() };
            let mut episode = Noop { episode: Episode::default() };
            let mut engine = NoopEngine;
            let mut records = NoopOutput;
            let mut progress = NoopOutput;
            let mut sink = NoopOutput;
            let token = StopToken::new();
            let mut sim = Simulation::new(
                SessionParameters::new(Period::Hours1, H, i64::MAX / 2),
                dependencies(),
                EngineSnapshot::new(1.0, 1000.0),
                StartMode::Fresh,
                Collaborators {
                    system: &mut system,
                    episode: &mut episode,
                    engine: &mut engine,
                    records: &mut records,
                    progress: &mut progress,
                    controller: &token,
                },
            );
            black_box(sim.run(&mut chart, &mut sink))
        })
    });
}

criterion_group!(benches, bench_align, bench_simulation);
criterion_main!(benches);

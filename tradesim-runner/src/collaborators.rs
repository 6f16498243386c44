//! Reference collaborators used by the runner.
//!
//! They carry no strategy: the candle loop, stop conditions and record output
//! run end to end, and a real trading system can be swapped in for
//! [`IdleTradingSystem`] without touching the rest.

use serde_json::json;

use tradesim_core::domain::{Chart, ChartKey, EngineSnapshot, Episode, ExitReason, CANDLE};
use tradesim_core::engine::{
    CollaboratorError, OutputSink, TradingEngine, TradingEpisode, TradingRecords, TradingSystem,
};

/// Dataset the per-cycle records are written to.
pub const EPISODE_DATASET: &str = "episode";

// ── Trading system ──

/// Trading system that places no orders and keeps its diagnostics.
#[derive(Debug, Default)]
pub struct IdleTradingSystem {
    infos: Vec<String>,
    errors: Vec<String>,
    runs: usize,
    last_close: Option<f64>,
}

impl IdleTradingSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infos(&self) -> &[String] {
        &self.infos
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Number of cycles run.
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Close of the last aligned candle of the market partitions, if any.
    pub fn last_close(&self) -> Option<f64> {
        self.last_close
    }
}

impl TradingSystem for IdleTradingSystem {
    fn initialize(&mut self) -> Result<(), CollaboratorError> {
        self.infos.clear();
        self.errors.clear();
        self.runs = 0;
        Ok(())
    }

    fn update_chart(&mut self, chart: &Chart) {
        let current = chart
            .keys()
            .filter(|key| matches!(key, ChartKey::Period(_)))
            .filter_map(|key| chart.current(key, CANDLE))
            .max_by_key(|candle| candle.end);
        if let Some(close) = current.and_then(|candle| candle.value("close")) {
            self.last_close = Some(close);
        }
    }

    fn maintain(&mut self, _snapshot: &mut EngineSnapshot) -> Result<(), CollaboratorError> {
        Ok(())
    }

    fn reset(&mut self) {}

    fn run(&mut self, _snapshot: &mut EngineSnapshot) -> Result<(), CollaboratorError> {
        self.runs += 1;
        Ok(())
    }

    fn finalize(&mut self) {
        tracing::debug!(
            runs = self.runs,
            infos = self.infos.len(),
            errors = self.errors.len(),
            "trading system finalized"
        );
    }

    fn report_info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }

    fn report_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

// ── Episode ──

/// Episode bookkeeping: opened on the first candle, closed on a session stop.
#[derive(Debug, Default)]
pub struct EpisodeLedger {
    episode: Episode,
    candles: usize,
}

impl EpisodeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candles maintained during the episode.
    pub fn candles(&self) -> usize {
        self.candles
    }
}

impl TradingEpisode for EpisodeLedger {
    fn initialize(&mut self) -> Result<(), CollaboratorError> {
        self.episode = Episode::default();
        self.candles = 0;
        Ok(())
    }

    fn open_episode(&mut self, snapshot: &EngineSnapshot) {
        self.episode.open(snapshot.candle.begin);
    }

    fn maintain(&mut self, snapshot: &EngineSnapshot) -> Result<(), CollaboratorError> {
        if !self.episode.is_open() {
            return Err(CollaboratorError::new(
                "episode",
                format!("candle {} maintained outside an open episode", snapshot.candle.index),
            ));
        }
        self.candles += 1;
        Ok(())
    }

    fn reset(&mut self) {}

    fn update_exit_type(&mut self, reason: ExitReason) {
        self.episode.exit_type = Some(reason);
    }

    fn close_episode(&mut self, snapshot: &EngineSnapshot) {
        self.episode.close(snapshot.candle.begin);
    }

    fn finalize(&mut self) {}

    fn episode(&self) -> &Episode {
        &self.episode
    }
}

// ── Engine ──

/// Engine that only writes candle and cycle into the snapshot.
#[derive(Debug, Default)]
pub struct SnapshotEngine {
    maintenance_calls: usize,
}

impl SnapshotEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn maintenance_calls(&self) -> usize {
        self.maintenance_calls
    }
}

impl TradingEngine for SnapshotEngine {
    fn maintain(&mut self, _snapshot: &mut EngineSnapshot) -> Result<(), CollaboratorError> {
        self.maintenance_calls += 1;
        Ok(())
    }

    fn reset(&mut self, _snapshot: &mut EngineSnapshot) {}
}

// ── Records ──

/// Appends one `episode` record per cycle.
#[derive(Debug, Default)]
pub struct CycleRecords {
    appended: usize,
}

impl CycleRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn appended(&self) -> usize {
        self.appended
    }
}

impl TradingRecords for CycleRecords {
    fn initialize(&mut self, _output: &mut dyn OutputSink) -> Result<(), CollaboratorError> {
        self.appended = 0;
        Ok(())
    }

    fn append_records(
        &mut self,
        snapshot: &EngineSnapshot,
        episode: &Episode,
        output: &mut dyn OutputSink,
    ) -> Result<(), CollaboratorError> {
        let record = json!({
            "candle_index": snapshot.candle.index,
            "candle_begin": snapshot.candle.begin,
            "candle_end": snapshot.candle.end,
            "cycle": snapshot.cycle.to_string(),
            "head_of_the_market": snapshot.head_of_the_market,
            "strategy_index": snapshot.strategy.value,
            "base_asset_balance": snapshot.base_asset_balance,
            "quoted_asset_balance": snapshot.quoted_asset_balance,
            "exit_type": episode.exit_type.map(|r| r.as_str()).unwrap_or(""),
        });
        output.append(EPISODE_DATASET, record)?;
        self.appended += 1;
        Ok(())
    }

    fn finalize(&mut self) {}
}

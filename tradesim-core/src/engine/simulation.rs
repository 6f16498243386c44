//! Simulation driver — replays the candles of a chart through the collaborators.
//!
//! Every series is order-checked once before the loop. Per candle, after the
//! warm-up window:
//! 1. Align every data dependency to the candle end
//! 2. Maintenance (system, episode, engine)
//! 3. Cycle `First`: settle existing orders, then check stop conditions
//! 4. Cycle `Second`: create new orders, then advance to the next candle
//!
//! Records are appended after each cycle. Output is flushed exactly once,
//! whatever ends the run, unless the run fails.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    Chart, ChartElement, Cycle, DataDependency, EngineSnapshot, ExitReason, Period,
    SessionParameters,
};

use super::advance::advance_candle;
use super::align::{align_chart, check_chart_order, AlignError, AlignmentLayout};
use super::collaborators::{
    CollaboratorError, OutputSink, ProgressSink, TradingEngine, TradingEpisode, TradingRecords,
    TradingSystem,
};
use super::control::SessionController;
use super::heartbeat::Heartbeat;
use super::stop::{evaluate_between_cycles, is_within_initial_datetime, resolve_start_index, StopOutcome};

/// Message given to the session controller when the dataset ends before the session starts.
pub const STALE_DATA_MESSAGE: &str =
    "Data is not up-to-date enough. Refresh the market data before running this session.";

/// How the start index is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartMode {
    /// Derive it from the session's initial datetime.
    #[default]
    Fresh,
    /// Continue at the index persisted in the snapshot.
    Resume,
}

/// Everything the driver calls into, wired once per run.
pub struct Collaborators<'a> {
    pub system: &'a mut dyn TradingSystem,
    pub episode: &'a mut dyn TradingEpisode,
    pub engine: &'a mut dyn TradingEngine,
    pub records: &'a mut dyn TradingRecords,
    pub progress: &'a mut dyn ProgressSink,
    pub controller: &'a dyn SessionController,
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub start_index: Option<usize>,
    /// Candles that executed at least cycle `First`.
    pub candles_processed: usize,
    /// Index of the last candle that executed a cycle.
    pub last_index: Option<usize>,
    pub exit_reason: Option<ExitReason>,
    pub head_of_the_market: bool,
    /// Output was written through `OutputSink::write_files`.
    pub flushed: bool,
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("chart has no candles for time frame {0}")]
    MissingCandles(Period),
    #[error("alignment failed: {0}")]
    Align(#[from] AlignError),
    #[error("collaborator failed: {0}")]
    Collaborator(#[from] CollaboratorError),
}

/// One simulation run over an in-memory chart.
pub struct Simulation<'a> {
    params: SessionParameters,
    dependencies: Vec<DataDependency>,
    layout: AlignmentLayout,
    snapshot: EngineSnapshot,
    mode: StartMode,
    heartbeat: Heartbeat,
    collab: Collaborators<'a>,
}

impl<'a> Simulation<'a> {
    pub fn new(
        params: SessionParameters,
        dependencies: Vec<DataDependency>,
        snapshot: EngineSnapshot,
        mode: StartMode,
        collab: Collaborators<'a>,
    ) -> Self {
        Self {
            params,
            dependencies,
            layout: AlignmentLayout::default(),
            snapshot,
            mode,
            heartbeat: Heartbeat::new(),
            collab,
        }
    }

    pub fn with_layout(mut self, layout: AlignmentLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: Heartbeat) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    pub fn params(&self) -> &SessionParameters {
        &self.params
    }

    pub fn snapshot(&self) -> &EngineSnapshot {
        &self.snapshot
    }

    /// Give back the snapshot, typically to persist it for the next run.
    pub fn into_snapshot(self) -> EngineSnapshot {
        self.snapshot
    }

    /// Run until the candles are exhausted or a stop condition fires.
    ///
    /// Expected terminations come back in the summary. An error means the run
    /// was abandoned: collaborators were not finalized and nothing was flushed.
    pub fn run(
        &mut self,
        chart: &mut Chart,
        output: &mut dyn OutputSink,
    ) -> Result<RunSummary, SimulationError> {
        let result = self.run_candles(chart, output);
        if let Err(err) = &result {
            tracing::error!(
                error = %err,
                index = self.snapshot.candle.index,
                cycle = %self.snapshot.cycle,
                "simulation aborted"
            );
        }
        result
    }

    fn run_candles(
        &mut self,
        chart: &mut Chart,
        output: &mut dyn OutputSink,
    ) -> Result<RunSummary, SimulationError> {
        let period = self.params.time_frame;
        let candle_count = match chart.candles(period) {
            Some(candles) if !candles.is_empty() => candles.len(),
            _ => return Err(SimulationError::MissingCandles(period)),
        };
        check_chart_order(chart)?;

        self.collab.system.initialize()?;
        self.collab.episode.initialize()?;
        self.collab.records.initialize(output)?;

        let start = match self.mode {
            StartMode::Resume => self.snapshot.candle.index,
            StartMode::Fresh => {
                let candles = chart
                    .candles(period)
                    .ok_or(SimulationError::MissingCandles(period))?;
                match resolve_start_index(candles, &self.params) {
                    Some(index) => index,
                    None => {
                        let last_end = candles.last().map(|c| c.end);
                        return self.stop_on_stale_data(last_end, output);
                    }
                }
            }
        };

        tracing::info!(
            start,
            candle_count,
            time_frame = %period,
            mode = ?self.mode,
            "simulation started"
        );

        let mut summary = RunSummary {
            start_index: Some(start),
            ..RunSummary::default()
        };

        // Stays true if the loop body never runs.
        self.snapshot.head_of_the_market = true;
        let mut first_iteration = true;

        for index in start..candle_count.saturating_sub(1) {
            let candle = candle_at(chart, period, index)?;
            self.collab
                .engine
                .set_current_candle(&mut self.snapshot, index, &candle);
            tracing::debug!(index, begin = candle.begin, end = candle.end, "candle");

            self.heartbeat
                .beat(&self.snapshot, &self.params, &mut *self.collab.progress);

            if first_iteration {
                self.collab.episode.open_episode(&self.snapshot);
                first_iteration = false;
            }

            if !is_within_initial_datetime(&self.snapshot, &self.params) {
                tracing::debug!(index, "candle before the initial datetime, skipped");
                continue;
            }

            align_chart(
                chart,
                candle.end,
                &self.dependencies,
                &self.layout,
                self.params.day_partitioned,
            )?;
            self.collab.system.update_chart(chart);

            self.collab.system.maintain(&mut self.snapshot)?;
            self.collab.episode.maintain(&self.snapshot)?;
            self.collab.engine.maintain(&mut self.snapshot)?;

            // ─── Cycle First ───
            // Orders may be filled or cancelled; none created.
            self.run_cycle(Cycle::First)?;
            summary.candles_processed += 1;
            summary.last_index = Some(index);

            let outcome =
                evaluate_between_cycles(&self.snapshot, &self.params, self.collab.controller);
            self.apply_stop(&outcome);
            self.append_records(output)?;
            if let Some(reason) = outcome.reason() {
                summary.exit_reason = Some(reason);
                break;
            }

            // ─── Cycle Second ───
            // Orders may be created in slots freed during First; none cancelled.
            self.run_cycle(Cycle::Second)?;

            let advance = advance_candle(&mut self.snapshot, candle_count, &self.params);
            if !advance.has_next() {
                tracing::info!(index, ?advance, "all available candles processed");
                self.collab
                    .episode
                    .update_exit_type(ExitReason::AllAvailableCandlesProcessed);
            }
            self.append_records(output)?;
            if !advance.has_next() {
                summary.exit_reason = Some(ExitReason::AllAvailableCandlesProcessed);
                break;
            }
        }

        summary.head_of_the_market = self.snapshot.head_of_the_market;
        self.finalize();
        output.write_files()?;
        summary.flushed = true;

        tracing::info!(
            candles_processed = summary.candles_processed,
            exit_reason = ?summary.exit_reason,
            head_of_the_market = summary.head_of_the_market,
            "simulation finished"
        );
        Ok(summary)
    }

    fn run_cycle(&mut self, cycle: Cycle) -> Result<(), SimulationError> {
        self.collab
            .engine
            .set_current_cycle(&mut self.snapshot, cycle);

        self.collab.system.reset();
        self.collab.episode.reset();
        self.collab.engine.reset(&mut self.snapshot);

        let message = format!(
            "Processing candle # {} @ the {} cycle.",
            self.snapshot.candle.index, cycle
        );
        tracing::debug!(%message);
        self.collab.system.report_info(&message);

        self.collab.system.run(&mut self.snapshot)?;
        Ok(())
    }

    fn apply_stop(&mut self, outcome: &StopOutcome) {
        let StopOutcome::Stop { reason, detail } = outcome else {
            return;
        };

        if let Some(detail) = detail {
            tracing::warn!(%detail, "balance limit breached");
            self.collab.system.report_error(detail);
        }

        self.collab.episode.update_exit_type(*reason);
        if reason.stops_session() {
            self.collab.episode.close_episode(&self.snapshot);
            self.collab.controller.stop(reason.as_str());
            tracing::info!(%reason, index = self.snapshot.candle.index, "stopping the session");
        } else {
            tracing::info!(%reason, index = self.snapshot.candle.index, "stop requested");
        }
    }

    fn append_records(&mut self, output: &mut dyn OutputSink) -> Result<(), SimulationError> {
        self.collab
            .records
            .append_records(&self.snapshot, self.collab.episode.episode(), output)?;
        Ok(())
    }

    fn stop_on_stale_data(
        &mut self,
        last_candle_end: Option<i64>,
        output: &mut dyn OutputSink,
    ) -> Result<RunSummary, SimulationError> {
        tracing::warn!(
            initial_datetime = self.params.time_range.initial_datetime,
            last_candle_end,
            "session starts after the last available candle"
        );
        self.collab.episode.update_exit_type(ExitReason::StaleData);
        self.collab.episode.close_episode(&self.snapshot);
        self.collab.controller.stop(STALE_DATA_MESSAGE);
        self.finalize();
        output.write_files()?;
        Ok(RunSummary {
            exit_reason: Some(ExitReason::StaleData),
            flushed: true,
            ..RunSummary::default()
        })
    }

    fn finalize(&mut self) {
        self.collab.system.finalize();
        self.collab.records.finalize();
        self.collab.episode.finalize();
    }
}

fn candle_at(chart: &Chart, period: Period, index: usize) -> Result<ChartElement, SimulationError> {
    chart
        .candles(period)
        .and_then(|candles| candles.get(index))
        .cloned()
        .ok_or(SimulationError::MissingCandles(period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Episode, ONE_HOUR_MS};
    use crate::engine::control::StopToken;
    use chrono::NaiveDate;

    const H: i64 = ONE_HOUR_MS;

    #[derive(Default)]
    struct System {
        runs: Vec<(usize, Cycle)>,
        infos: Vec<String>,
        errors: Vec<String>,
        finalized: bool,
        fail_at: Option<usize>,
    }

    impl TradingSystem for System {
        fn initialize(&mut self) -> Result<(), CollaboratorError> {
            Ok(())
        }
        fn update_chart(&mut self, _chart: &Chart) {}
        fn maintain(&mut self, _snapshot: &mut EngineSnapshot) -> Result<(), CollaboratorError> {
            Ok(())
        }
        fn reset(&mut self) {}
        fn run(&mut self, snapshot: &mut EngineSnapshot) -> Result<(), CollaboratorError> {
            if self.fail_at == Some(snapshot.candle.index) {
                return Err(CollaboratorError::new("system", "boom"));
            }
            self.runs.push((snapshot.candle.index, snapshot.cycle));
            Ok(())
        }
        fn finalize(&mut self) {
            self.finalized = true;
        }
        fn report_info(&mut self, message: &str) {
            self.infos.push(message.to_string());
        }
        fn report_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    #[derive(Default)]
    struct Ledger {
        episode: Episode,
    }

    impl TradingEpisode for Ledger {
        fn initialize(&mut self) -> Result<(), CollaboratorError> {
            Ok(())
        }
        fn open_episode(&mut self, snapshot: &EngineSnapshot) {
            self.episode.open(snapshot.candle.begin);
        }
        fn maintain(&mut self, _snapshot: &EngineSnapshot) -> Result<(), CollaboratorError> {
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

    struct Engine;

    impl TradingEngine for Engine {
        fn maintain(&mut self, _snapshot: &mut EngineSnapshot) -> Result<(), CollaboratorError> {
            Ok(())
        }
        fn reset(&mut self, _snapshot: &mut EngineSnapshot) {}
    }

    #[derive(Default)]
    struct Records {
        appended: usize,
    }

    impl TradingRecords for Records {
        fn initialize(&mut self, _output: &mut dyn OutputSink) -> Result<(), CollaboratorError> {
            Ok(())
        }
        fn append_records(
            &mut self,
            _snapshot: &EngineSnapshot,
            _episode: &Episode,
            _output: &mut dyn OutputSink,
        ) -> Result<(), CollaboratorError> {
            self.appended += 1;
            Ok(())
        }
        fn finalize(&mut self) {}
    }

    #[derive(Default)]
    struct Sink {
        flushes: usize,
    }

    impl OutputSink for Sink {
        fn append(&mut self, _dataset: &str, _record: serde_json::Value) -> Result<(), CollaboratorError> {
            Ok(())
        }
        fn write_files(&mut self) -> Result<(), CollaboratorError> {
            self.flushes += 1;
            Ok(())
        }
    }

    struct Quiet;

    impl ProgressSink for Quiet {
        fn heartbeat(&mut self, _text: &str, _percentage: f64) {}
        fn new_internal_loop(&mut self, _day: NaiveDate, _percentage: f64) {}
    }

    fn chart(n: i64) -> Chart {
        let mut chart = Chart::new();
        chart.insert_series(
            Period::Hours1,
            crate::domain::CANDLES,
            (0..n).map(|i| ChartElement::new(i * H, (i + 1) * H)).collect(),
        );
        chart
    }

    #[test]
    fn runs_both_cycles_until_the_last_closed_candle() {
        let mut system = System::default();
        let mut ledger = Ledger::default();
        let mut records = Records::default();
        let mut sink = Sink::default();
        let mut engine = Engine;
        let mut progress = Quiet;
        let token = StopToken::new();
        let params = SessionParameters::new(Period::Hours1, H, 100 * H);
        let mut chart = chart(5);

        let summary = {
            let mut sim = Simulation::new(
                params,
                Vec::new(),
                EngineSnapshot::new(0.0, 0.0),
                StartMode::Fresh,
                Collaborators {
                    system: &mut system,
                    episode: &mut ledger,
                    engine: &mut engine,
                    records: &mut records,
                    progress: &mut progress,
                    controller: &token,
                },
            );
            assert_eq!(sim.params().time_frame, Period::Hours1);
            let summary = sim.run(&mut chart, &mut sink).unwrap();
            assert_eq!(sim.snapshot().candle.index, 4);
            summary
        };

        assert_eq!(summary.start_index, Some(0));
        assert_eq!(summary.candles_processed, 4);
        assert_eq!(summary.last_index, Some(3));
        assert_eq!(summary.exit_reason, Some(ExitReason::AllAvailableCandlesProcessed));
        assert!(summary.head_of_the_market);
        assert!(summary.flushed);
        assert_eq!(sink.flushes, 1);
        assert_eq!(records.appended, 8);
        assert_eq!(system.runs.len(), 8);
        assert_eq!(system.runs[0], (0, Cycle::First));
        assert_eq!(system.runs[1], (0, Cycle::Second));
        assert_eq!(system.infos[1], "Processing candle # 0 @ the Second cycle.");
        assert!(system.finalized);
        assert_eq!(ledger.episode.exit_type, Some(ExitReason::AllAvailableCandlesProcessed));
        assert!(ledger.episode.is_open());
        assert!(!token.session_stop_requested());
    }

    #[test]
    fn collaborator_failure_aborts_without_flush() {
        let mut system = System {
            fail_at: Some(2),
            ..System::default()
        };
        let mut ledger = Ledger::default();
        let mut records = Records::default();
        let mut sink = Sink::default();
        let token = StopToken::new();
        let mut chart = chart(10);

        let result = Simulation::new(
            SessionParameters::new(Period::Hours1, H, 100 * H),
            Vec::new(),
            EngineSnapshot::new(0.0, 0.0),
            StartMode::Fresh,
            Collaborators {
                system: &mut system,
                episode: &mut ledger,
                engine: &mut Engine,
                records: &mut records,
                progress: &mut Quiet,
                controller: &token,
            },
        )
        .run(&mut chart, &mut sink);

        assert!(matches!(result, Err(SimulationError::Collaborator(_))));
        assert_eq!(sink.flushes, 0);
        assert!(!system.finalized);
    }

    #[test]
    fn missing_candles_is_an_error() {
        let mut system = System::default();
        let mut ledger = Ledger::default();
        let mut records = Records::default();
        let token = StopToken::new();

        let result = Simulation::new(
            SessionParameters::new(Period::Hours4, 0, H),
            Vec::new(),
            EngineSnapshot::new(0.0, 0.0),
            StartMode::Fresh,
            Collaborators {
                system: &mut system,
                episode: &mut ledger,
                engine: &mut Engine,
                records: &mut records,
                progress: &mut Quiet,
                controller: &token,
            },
        )
        .run(&mut chart(10), &mut Sink::default());

        assert!(matches!(
            result,
            Err(SimulationError::MissingCandles(Period::Hours4))
        ));
    }

    #[test]
    fn resume_starts_at_persisted_index() {
        let mut system = System::default();
        let mut ledger = Ledger::default();
        let mut records = Records::default();
        let token = StopToken::new();
        let mut snapshot = EngineSnapshot::new(0.0, 0.0);
        snapshot.candle.index = 7;

        let summary = Simulation::new(
            // initial datetime far ahead: a fresh run would see stale data
            SessionParameters::new(Period::Hours1, 1_000 * H, 2_000 * H),
            Vec::new(),
            snapshot,
            StartMode::Resume,
            Collaborators {
                system: &mut system,
                episode: &mut ledger,
                engine: &mut Engine,
                records: &mut records,
                progress: &mut Quiet,
                controller: &token,
            },
        )
        .run(&mut chart(10), &mut Sink::default())
        .unwrap();

        assert_eq!(summary.start_index, Some(7));
        // every candle is warm-up relative to the initial datetime
        assert_eq!(summary.candles_processed, 0);
        assert!(system.runs.is_empty());
        assert_eq!(summary.exit_reason, None);
        assert!(summary.flushed);
    }
}

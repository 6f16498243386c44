//! Collaborator traits — the black boxes the candle loop drives.
//!
//! The driver owns the [`EngineSnapshot`] and lends it to each call. All
//! calls are synchronous and made one at a time from the driver's thread.
//! A collaborator that fails returns a [`CollaboratorError`]; the driver
//! treats every such error as fatal for the run.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{Chart, ChartElement, Cycle, EngineSnapshot, Episode, ExitReason};

/// Failure raised by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{component}: {message}")]
pub struct CollaboratorError {
    pub component: String,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Strategy evaluator: runs the trading logic for one cycle.
///
/// # Cycle contract
/// - During [`Cycle::First`] existing orders may fill or be cancelled, but no
///   new order may be created.
/// - During [`Cycle::Second`] new orders may be created, but none cancelled.
pub trait TradingSystem: Send {
    fn initialize(&mut self) -> Result<(), CollaboratorError>;

    /// Called once per candle after alignment, before maintenance.
    fn update_chart(&mut self, chart: &Chart);

    fn maintain(&mut self, snapshot: &mut EngineSnapshot) -> Result<(), CollaboratorError>;

    /// Clear per-cycle scratch state.
    fn reset(&mut self);

    fn run(&mut self, snapshot: &mut EngineSnapshot) -> Result<(), CollaboratorError>;

    fn finalize(&mut self);

    fn report_info(&mut self, _message: &str) {}

    fn report_error(&mut self, _message: &str) {}
}

/// Episode lifecycle bookkeeping.
pub trait TradingEpisode: Send {
    fn initialize(&mut self) -> Result<(), CollaboratorError>;
    fn open_episode(&mut self, snapshot: &EngineSnapshot);
    fn maintain(&mut self, snapshot: &EngineSnapshot) -> Result<(), CollaboratorError>;
    fn reset(&mut self);
    fn update_exit_type(&mut self, reason: ExitReason);
    fn close_episode(&mut self, snapshot: &EngineSnapshot);
    fn finalize(&mut self);
    fn episode(&self) -> &Episode;
}

/// Mutable engine state owner. The defaults write straight into the snapshot.
pub trait TradingEngine: Send {
    fn set_current_candle(&mut self, snapshot: &mut EngineSnapshot, index: usize, candle: &ChartElement) {
        snapshot.set_candle(index, candle);
    }

    fn set_current_cycle(&mut self, snapshot: &mut EngineSnapshot, cycle: Cycle) {
        snapshot.cycle = cycle;
    }

    fn maintain(&mut self, snapshot: &mut EngineSnapshot) -> Result<(), CollaboratorError>;

    fn reset(&mut self, snapshot: &mut EngineSnapshot);
}

/// Turns the state after a cycle into output records.
pub trait TradingRecords: Send {
    fn initialize(&mut self, output: &mut dyn OutputSink) -> Result<(), CollaboratorError>;

    fn append_records(
        &mut self,
        snapshot: &EngineSnapshot,
        episode: &Episode,
        output: &mut dyn OutputSink,
    ) -> Result<(), CollaboratorError>;

    fn finalize(&mut self);
}

/// Destination for output records. `write_files` is called once per run.
pub trait OutputSink: Send {
    fn append(&mut self, dataset: &str, record: serde_json::Value) -> Result<(), CollaboratorError>;
    fn write_files(&mut self) -> Result<(), CollaboratorError>;
}

/// Receiver of heartbeat notifications.
pub trait ProgressSink: Send {
    fn heartbeat(&mut self, text: &str, percentage: f64);

    /// A new simulated day started.
    fn new_internal_loop(&mut self, day: NaiveDate, percentage: f64);
}

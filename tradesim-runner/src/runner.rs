//! Session runner — wires config, chart, snapshot and collaborators into one run.
//!
//! Layout of a session directory (`<output_dir>/<session_id>/`):
//! - `snapshot.json` — engine state for the next invocation
//! - `run-NNN/` — one directory per invocation with a CSV per record dataset
//!   and `summary.json`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradesim_core::domain::{EngineSnapshot, Episode};
use tradesim_core::engine::{
    Collaborators, RunSummary, SessionController, Simulation, SimulationError, StartMode,
    StopToken, TradingEpisode,
};

use crate::collaborators::{CycleRecords, EpisodeLedger, IdleTradingSystem, SnapshotEngine};
use crate::config::{ConfigError, SessionConfig, SessionId};
use crate::data_loader::{load_chart, resolve_chart_path, LoadError};
use crate::output::FileOutput;
use crate::progress::TracingProgress;
use crate::snapshot_store::{load_snapshot, save_snapshot, SNAPSHOT_FILE};

/// Current schema version for `summary.json`.
pub const SCHEMA_VERSION: u32 = 1;

pub const SUMMARY_FILE: &str = "summary.json";

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What one invocation of a session did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub schema_version: u32,
    pub session_id: SessionId,
    pub run_dir: PathBuf,
    pub chart: PathBuf,
    pub mode: StartMode,
    pub summary: RunSummary,
    pub episode: Episode,
    pub snapshot: EngineSnapshot,
    /// Reason the session controller was given, if it was told to stop.
    pub stop_reason: Option<String>,
    pub records_appended: usize,
    pub info_messages: usize,
    pub error_messages: Vec<String>,
}

/// Run one invocation of the session described by `config`.
///
/// With `resume`, the snapshot saved by the previous invocation is picked up;
/// without one on disk the session starts fresh.
pub fn run_session(
    config: &SessionConfig,
    chart_path: &Path,
    output_dir: &Path,
    resume: bool,
    token: &StopToken,
) -> Result<SessionReport, RunError> {
    let session_id = config.session_id()?;
    let session_dir = output_dir.join(&session_id);
    create_dir(&session_dir)?;

    let snapshot_path = session_dir.join(SNAPSHOT_FILE);
    let (mode, snapshot) = match (resume, load_snapshot(&snapshot_path)?) {
        (true, Some(snapshot)) => (StartMode::Resume, snapshot),
        (true, None) => {
            tracing::warn!(session = %session_id, "no saved snapshot, starting fresh");
            (StartMode::Fresh, config.initial_snapshot())
        }
        (false, _) => (StartMode::Fresh, config.initial_snapshot()),
    };

    let params = config.session_parameters();
    let day = if params.day_partitioned {
        snapshot.process_day()
    } else {
        None
    };
    let chart_file = resolve_chart_path(chart_path, day)?;
    let mut chart = load_chart(&chart_file, params.time_frame)?;

    let run_dir = next_run_dir(&session_dir);
    tracing::info!(
        session = %session_id,
        chart = %chart_file.display(),
        run_dir = %run_dir.display(),
        ?mode,
        "session run starting"
    );

    let mut system = IdleTradingSystem::new();
    let mut ledger = EpisodeLedger::new();
    let mut engine = SnapshotEngine::new();
    let mut records = CycleRecords::new();
    let mut progress = TracingProgress::new();
    let mut output = FileOutput::new(&run_dir);

    let mut sim = Simulation::new(
        params,
        config.dependencies.clone(),
        snapshot,
        mode,
        Collaborators {
            system: &mut system,
            episode: &mut ledger,
            engine: &mut engine,
            records: &mut records,
            progress: &mut progress,
            controller: token,
        },
    )
    .with_layout(config.alignment_layout());

    let summary = sim.run(&mut chart, &mut output)?;
    let snapshot = sim.into_snapshot();
    save_snapshot(&snapshot_path, &snapshot)?;

    let report = SessionReport {
        schema_version: SCHEMA_VERSION,
        session_id,
        run_dir: run_dir.clone(),
        chart: chart_file,
        mode,
        summary,
        episode: ledger.episode().clone(),
        snapshot,
        stop_reason: token
            .session_stop_requested()
            .then(|| token.stop_reason())
            .flatten(),
        records_appended: records.appended(),
        info_messages: system.infos().len(),
        error_messages: system.errors().to_vec(),
    };

    create_dir(&run_dir)?;
    let summary_path = run_dir.join(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(&report).map_err(|source| LoadError::Json {
        path: summary_path.clone(),
        source,
    })?;
    std::fs::write(&summary_path, json).map_err(|source| RunError::Io {
        path: summary_path,
        source,
    })?;

    tracing::info!(
        candles = report.summary.candles_processed,
        exit_reason = ?report.summary.exit_reason,
        records = report.records_appended,
        "session run finished"
    );
    Ok(report)
}

fn create_dir(path: &Path) -> Result<(), RunError> {
    std::fs::create_dir_all(path).map_err(|source| RunError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// First `run-NNN` directory under `session_dir` that does not exist yet.
fn next_run_dir(session_dir: &Path) -> PathBuf {
    (1..)
        .map(|n: u32| session_dir.join(format!("run-{n:03}")))
        .find(|dir| !dir.exists())
        .unwrap_or_else(|| session_dir.join("run"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_dirs_are_numbered() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(next_run_dir(dir.path()), dir.path().join("run-001"));
        std::fs::create_dir(dir.path().join("run-001")).unwrap();
        assert_eq!(next_run_dir(dir.path()), dir.path().join("run-002"));
    }
}

//! Tradesim Runner — session orchestration around the core simulation driver.
//!
//! This crate builds on `tradesim-core` to provide:
//! - TOML session configuration with content-addressed session ids
//! - Chart loading (single file or one file per UTC day)
//! - Snapshot persistence for resumed runs
//! - Reference collaborators and a CSV file output sink
//! - `run_session()`, used by the CLI

pub mod collaborators;
pub mod config;
pub mod data_loader;
pub mod output;
pub mod progress;
pub mod runner;
pub mod snapshot_store;

pub use collaborators::{
    CycleRecords, EpisodeLedger, IdleTradingSystem, SnapshotEngine, EPISODE_DATASET,
};
pub use config::{AssetConfig, ConfigError, LayoutConfig, SessionConfig, SessionId};
pub use data_loader::{load_chart, resolve_chart_path, LoadError};
pub use output::FileOutput;
pub use progress::TracingProgress;
pub use runner::{run_session, RunError, SessionReport, SUMMARY_FILE};
pub use snapshot_store::{load_snapshot, save_snapshot, SNAPSHOT_FILE};

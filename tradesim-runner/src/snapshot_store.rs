//! Snapshot persistence between invocations of a session.

use std::path::Path;

use tradesim_core::domain::EngineSnapshot;

use crate::data_loader::LoadError;

/// File name of the persisted snapshot inside a session directory.
pub const SNAPSHOT_FILE: &str = "snapshot.json";

/// Load the snapshot saved by a previous run, if there is one.
pub fn load_snapshot(path: &Path) -> Result<Option<EngineSnapshot>, LoadError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
}

pub fn save_snapshot(path: &Path, snapshot: &EngineSnapshot) -> Result<(), LoadError> {
    let json = serde_json::to_string_pretty(snapshot).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

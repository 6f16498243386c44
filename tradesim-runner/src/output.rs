//! File output — buffers records per dataset and writes one CSV per dataset.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tradesim_core::engine::{CollaboratorError, OutputSink};

const COMPONENT: &str = "output";

/// Output sink writing `<dataset>.csv` files into a session directory.
#[derive(Debug)]
pub struct FileOutput {
    dir: PathBuf,
    datasets: BTreeMap<String, Vec<Value>>,
    written: Vec<PathBuf>,
}

impl FileOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            datasets: BTreeMap::new(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Records buffered for `dataset` so far.
    pub fn records(&self, dataset: &str) -> &[Value] {
        self.datasets.get(dataset).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Files produced by `write_files`.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl OutputSink for FileOutput {
    fn append(&mut self, dataset: &str, record: Value) -> Result<(), CollaboratorError> {
        if !record.is_object() {
            return Err(CollaboratorError::new(
                COMPONENT,
                format!("record for dataset {dataset} is not an object"),
            ));
        }
        self.datasets
            .entry(dataset.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    fn write_files(&mut self) -> Result<(), CollaboratorError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            CollaboratorError::new(COMPONENT, format!("create {}: {e}", self.dir.display()))
        })?;

        for (dataset, records) in &self.datasets {
            let path = self.dir.join(format!("{dataset}.csv"));
            let csv = records_to_csv(records)
                .map_err(|e| CollaboratorError::new(COMPONENT, format!("{dataset}: {e}")))?;
            std::fs::write(&path, csv).map_err(|e| {
                CollaboratorError::new(COMPONENT, format!("write {}: {e}", path.display()))
            })?;
            tracing::info!(path = %path.display(), rows = records.len(), "dataset written");
            self.written.push(path);
        }
        Ok(())
    }
}

/// Render object records as CSV. Columns are the union of all keys, sorted.
fn records_to_csv(records: &[Value]) -> Result<String, csv::Error> {
    let columns: BTreeSet<&str> = records
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|obj| obj.keys().map(String::as_str))
        .collect();

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(&columns)?;
    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|column| match record.get(*column) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            })
            .collect();
        wtr.write_record(&row)?;
    }
    let data = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

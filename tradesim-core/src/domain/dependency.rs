//! Data dependencies — the strategy inputs the aligner keeps positioned at "now".

use super::period::Period;
use serde::{Deserialize, Serialize};

/// Which kind of dataset a dependency reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyCategory {
    /// Period-keyed series split in per-day files (sub-hour periods).
    #[serde(rename = "Multi-Period-Daily")]
    MultiPeriodDaily,
    /// Period-keyed series stored in market-wide files.
    #[serde(rename = "Multi-Period-Market")]
    MultiPeriodMarket,
    /// A single series not keyed by period.
    #[serde(rename = "Single-File")]
    SingleFile,
}

/// One declared strategy input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDependency {
    pub category: DependencyCategory,
    /// Name of the "current element" alias, e.g. `bollingerBand`.
    pub singular: String,
    /// Name of the series, e.g. `bollingerBands`.
    pub plural: String,
    /// Restrict a multi-period dependency to one time frame.
    /// `None` aligns it in every partition of its category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

impl DataDependency {
    pub fn new(
        category: DependencyCategory,
        singular: impl Into<String>,
        plural: impl Into<String>,
    ) -> Self {
        Self {
            category,
            singular: singular.into(),
            plural: plural.into(),
            period: None,
        }
    }

    pub fn market(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self::new(DependencyCategory::MultiPeriodMarket, singular, plural)
    }

    pub fn daily(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self::new(DependencyCategory::MultiPeriodDaily, singular, plural)
    }

    pub fn single_file(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self::new(DependencyCategory::SingleFile, singular, plural)
    }

    pub fn at_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Whether this dependency should be aligned in the partition of `period`.
    pub fn applies_to(&self, period: Period) -> bool {
        self.period.map_or(true, |p| p == period)
    }
}

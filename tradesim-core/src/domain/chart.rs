//! Chart — per-time-frame candle and indicator series plus "current element" aliases.

use super::period::{Period, UnknownPeriod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Plural series name holding the raw candles of a partition.
pub const CANDLES: &str = "candles";
/// Singular alias for the current candle of a partition.
pub const CANDLE: &str = "candle";

const ANY_TIME_FRAME: &str = "AnyTimeFrame";

/// One element of a chart series: a candle or a computed indicator value.
///
/// The validity window is `[begin, end)` in epoch milliseconds. Every other
/// property (open, close, bollinger upper band, ...) lives in `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartElement {
    pub begin: i64,
    pub end: i64,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl ChartElement {
    pub fn new(begin: i64, end: i64) -> Self {
        Self {
            begin,
            end,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

/// Key of a chart partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChartKey {
    Period(Period),
    /// Series that are not period-keyed (single-file datasets).
    AnyTimeFrame,
}

impl fmt::Display for ChartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKey::Period(p) => f.write_str(p.label()),
            ChartKey::AnyTimeFrame => f.write_str(ANY_TIME_FRAME),
        }
    }
}

impl FromStr for ChartKey {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ANY_TIME_FRAME {
            Ok(ChartKey::AnyTimeFrame)
        } else {
            s.parse().map(ChartKey::Period)
        }
    }
}

impl TryFrom<String> for ChartKey {
    type Error = UnknownPeriod;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChartKey> for String {
    fn from(key: ChartKey) -> Self {
        key.to_string()
    }
}

impl From<Period> for ChartKey {
    fn from(p: Period) -> Self {
        ChartKey::Period(p)
    }
}

/// Series of one time frame, keyed by plural name, plus the singular aliases
/// the aligner keeps pointed at the element relevant to "now".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    #[serde(default)]
    pub series: BTreeMap<String, Vec<ChartElement>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub current: BTreeMap<String, ChartElement>,
}

impl Partition {
    pub fn series(&self, plural: &str) -> Option<&[ChartElement]> {
        self.series.get(plural).map(|v| v.as_slice())
    }

    pub fn current(&self, singular: &str) -> Option<&ChartElement> {
        self.current.get(singular)
    }

    pub fn set_current(&mut self, singular: &str, element: ChartElement) {
        self.current.insert(singular.to_string(), element);
    }

    pub fn clear_current(&mut self, singular: &str) {
        self.current.remove(singular);
    }
}

/// The full in-memory dataset handed to a simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chart {
    partitions: BTreeMap<ChartKey, Partition>,
}

impl Chart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a plural series in the partition for `key`.
    pub fn insert_series(
        &mut self,
        key: impl Into<ChartKey>,
        plural: impl Into<String>,
        elements: Vec<ChartElement>,
    ) {
        self.partitions
            .entry(key.into())
            .or_default()
            .series
            .insert(plural.into(), elements);
    }

    pub fn partition(&self, key: ChartKey) -> Option<&Partition> {
        self.partitions.get(&key)
    }

    pub fn partition_mut(&mut self, key: ChartKey) -> Option<&mut Partition> {
        self.partitions.get_mut(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = ChartKey> + '_ {
        self.partitions.keys().copied()
    }

    /// Candles of the given time frame, if loaded.
    pub fn candles(&self, period: Period) -> Option<&[ChartElement]> {
        self.partition(ChartKey::Period(period))
            .and_then(|p| p.series(CANDLES))
    }

    /// Current element alias of a partition.
    pub fn current(&self, key: ChartKey, singular: &str) -> Option<&ChartElement> {
        self.partition(key).and_then(|p| p.current(singular))
    }
}

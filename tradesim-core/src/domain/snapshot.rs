//! Engine snapshot — the mutable trading state shared by all collaborators.
//!
//! Owned by the simulation driver for the duration of a run and lent by
//! reference into collaborator calls. Persisted between invocations so a
//! later run can resume at `candle.index` / `process_date`.

use super::chart::ChartElement;
use super::period::ONE_DAY_MS;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sub-phase of a candle.
///
/// `First` settles existing orders (fills, cancellations) and may not create
/// new ones. `Second` may create orders, including into slots freed during
/// `First`, and may not cancel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cycle {
    #[default]
    First,
    Second,
}

impl Cycle {
    pub fn allows_order_creation(self) -> bool {
        matches!(self, Cycle::Second)
    }

    pub fn allows_cancellation(self) -> bool {
        matches!(self, Cycle::First)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cycle::First => f.write_str("First"),
            Cycle::Second => f.write_str("Second"),
        }
    }
}

/// The candle the simulation is standing at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCandle {
    pub index: usize,
    pub begin: i64,
    pub end: i64,
}

/// Strategy position marker. Flat while `value == initial_value`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyIndex {
    pub value: i64,
    pub initial_value: i64,
}

impl StrategyIndex {
    pub fn new(initial_value: i64) -> Self {
        Self {
            value: initial_value,
            initial_value,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.value == self.initial_value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub candle: CurrentCandle,
    pub head_of_the_market: bool,
    pub cycle: Cycle,
    pub strategy: StrategyIndex,
    /// UTC midnight (ms) of the day whose dataset is being processed.
    /// Only meaningful for day-partitioned datasets.
    pub process_date: i64,
    pub base_asset_balance: f64,
    pub quoted_asset_balance: f64,
}

impl EngineSnapshot {
    pub fn new(base_asset_balance: f64, quoted_asset_balance: f64) -> Self {
        Self {
            candle: CurrentCandle::default(),
            head_of_the_market: false,
            cycle: Cycle::First,
            strategy: StrategyIndex::default(),
            process_date: 0,
            base_asset_balance,
            quoted_asset_balance,
        }
    }

    pub fn with_strategy_initial_index(mut self, initial_value: i64) -> Self {
        self.strategy = StrategyIndex::new(initial_value);
        self
    }

    pub fn with_process_date(mut self, process_date: i64) -> Self {
        self.process_date = process_date;
        self
    }

    /// Point the snapshot at candle `index`.
    pub fn set_candle(&mut self, index: usize, element: &ChartElement) {
        self.candle = CurrentCandle {
            index,
            begin: element.begin,
            end: element.end,
        };
    }

    pub fn is_flat(&self) -> bool {
        self.strategy.is_flat()
    }

    /// Move the day pointer forward one UTC day.
    pub fn advance_process_date(&mut self) {
        self.process_date += ONE_DAY_MS;
    }

    pub fn process_day(&self) -> Option<NaiveDate> {
        DateTime::<Utc>::from_timestamp_millis(self.process_date).map(|d| d.date_naive())
    }
}

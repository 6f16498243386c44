//! Session parameters — immutable per-run configuration.

use super::period::Period;
use serde::{Deserialize, Serialize};

/// Time range of the session, epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub initial_datetime: i64,
    pub final_datetime: i64,
}

/// Which heartbeat texts to emit while the simulation runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    pub date: bool,
    pub candle_index: bool,
}

impl HeartbeatConfig {
    pub fn is_enabled(&self) -> bool {
        self.date || self.candle_index
    }
}

/// Balance thresholds for one asset. A breach stops the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceLimits {
    pub minimum_balance: Option<f64>,
    pub maximum_balance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionParameters {
    pub time_range: TimeRange,
    pub time_frame: Period,
    #[serde(default)]
    pub heartbeats: Option<HeartbeatConfig>,
    #[serde(default)]
    pub base_asset: BalanceLimits,
    #[serde(default)]
    pub quoted_asset: BalanceLimits,
    /// Candles and sub-hour indicators arrive as one dataset per UTC day.
    #[serde(default)]
    pub day_partitioned: bool,
}

impl SessionParameters {
    pub fn new(time_frame: Period, initial_datetime: i64, final_datetime: i64) -> Self {
        Self {
            time_range: TimeRange {
                initial_datetime,
                final_datetime,
            },
            time_frame,
            heartbeats: None,
            base_asset: BalanceLimits::default(),
            quoted_asset: BalanceLimits::default(),
            day_partitioned: false,
        }
    }

    pub fn with_heartbeats(mut self, date: bool, candle_index: bool) -> Self {
        self.heartbeats = Some(HeartbeatConfig { date, candle_index });
        self
    }

    pub fn with_base_asset_limits(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.base_asset = BalanceLimits {
            minimum_balance: min,
            maximum_balance: max,
        };
        self
    }

    pub fn with_quoted_asset_limits(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.quoted_asset = BalanceLimits {
            minimum_balance: min,
            maximum_balance: max,
        };
        self
    }

    pub fn day_partitioned(mut self, value: bool) -> Self {
        self.day_partitioned = value;
        self
    }

    /// Time frame duration in milliseconds.
    pub fn time_frame_ms(&self) -> i64 {
        self.time_frame.millis()
    }
}

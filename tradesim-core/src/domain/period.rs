//! Time frames used to key chart partitions.
//!
//! Market periods (one hour and above) are stored in single market-wide files.
//! Daily periods (below one hour) are stored in per-day files and are only
//! aligned when the session runs on a day-partitioned dataset.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ONE_MINUTE_MS: i64 = 60 * 1000;
pub const ONE_HOUR_MS: i64 = 60 * ONE_MINUTE_MS;
pub const ONE_DAY_MS: i64 = 24 * ONE_HOUR_MS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown time frame label: {0}")]
pub struct UnknownPeriod(pub String);

/// A fixed candle duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    Hours24,
    Hours12,
    Hours8,
    Hours6,
    Hours4,
    Hours3,
    Hours2,
    Hours1,
    Minutes45,
    Minutes40,
    Minutes30,
    Minutes20,
    Minutes15,
    Minutes10,
    Minutes5,
    Minutes4,
    Minutes3,
    Minutes2,
    Minutes1,
}

impl Period {
    /// Periods stored in market-wide files, longest first.
    pub const MARKET: [Period; 8] = [
        Period::Hours24,
        Period::Hours12,
        Period::Hours8,
        Period::Hours6,
        Period::Hours4,
        Period::Hours3,
        Period::Hours2,
        Period::Hours1,
    ];

    /// Periods stored in per-day files, longest first.
    pub const DAILY: [Period; 11] = [
        Period::Minutes45,
        Period::Minutes40,
        Period::Minutes30,
        Period::Minutes20,
        Period::Minutes15,
        Period::Minutes10,
        Period::Minutes5,
        Period::Minutes4,
        Period::Minutes3,
        Period::Minutes2,
        Period::Minutes1,
    ];

    /// Duration in milliseconds.
    pub fn millis(self) -> i64 {
        match self {
            Period::Hours24 => 24 * ONE_HOUR_MS,
            Period::Hours12 => 12 * ONE_HOUR_MS,
            Period::Hours8 => 8 * ONE_HOUR_MS,
            Period::Hours6 => 6 * ONE_HOUR_MS,
            Period::Hours4 => 4 * ONE_HOUR_MS,
            Period::Hours3 => 3 * ONE_HOUR_MS,
            Period::Hours2 => 2 * ONE_HOUR_MS,
            Period::Hours1 => ONE_HOUR_MS,
            Period::Minutes45 => 45 * ONE_MINUTE_MS,
            Period::Minutes40 => 40 * ONE_MINUTE_MS,
            Period::Minutes30 => 30 * ONE_MINUTE_MS,
            Period::Minutes20 => 20 * ONE_MINUTE_MS,
            Period::Minutes15 => 15 * ONE_MINUTE_MS,
            Period::Minutes10 => 10 * ONE_MINUTE_MS,
            Period::Minutes5 => 5 * ONE_MINUTE_MS,
            Period::Minutes4 => 4 * ONE_MINUTE_MS,
            Period::Minutes3 => 3 * ONE_MINUTE_MS,
            Period::Minutes2 => 2 * ONE_MINUTE_MS,
            Period::Minutes1 => ONE_MINUTE_MS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Hours24 => "24-hs",
            Period::Hours12 => "12-hs",
            Period::Hours8 => "08-hs",
            Period::Hours6 => "06-hs",
            Period::Hours4 => "04-hs",
            Period::Hours3 => "03-hs",
            Period::Hours2 => "02-hs",
            Period::Hours1 => "01-hs",
            Period::Minutes45 => "45-min",
            Period::Minutes40 => "40-min",
            Period::Minutes30 => "30-min",
            Period::Minutes20 => "20-min",
            Period::Minutes15 => "15-min",
            Period::Minutes10 => "10-min",
            Period::Minutes5 => "05-min",
            Period::Minutes4 => "04-min",
            Period::Minutes3 => "03-min",
            Period::Minutes2 => "02-min",
            Period::Minutes1 => "01-min",
        }
    }

    /// True for periods that live in per-day files.
    pub fn is_daily(self) -> bool {
        self.millis() < ONE_HOUR_MS
    }

    /// Number of candles of this period in one UTC day.
    pub fn candles_per_day(self) -> i64 {
        ONE_DAY_MS / self.millis()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::MARKET
            .iter()
            .chain(Period::DAILY.iter())
            .copied()
            .find(|p| p.label() == s)
            .ok_or_else(|| UnknownPeriod(s.to_string()))
    }
}

impl TryFrom<String> for Period {
    type Error = UnknownPeriod;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.label().to_string()
    }
}

//! Domain types for the candle simulation.

pub mod chart;
pub mod dependency;
pub mod episode;
pub mod period;
pub mod session;
pub mod snapshot;

pub use chart::{Chart, ChartElement, ChartKey, Partition, CANDLE, CANDLES};
pub use dependency::{DataDependency, DependencyCategory};
pub use episode::{Episode, EpisodeState, ExitReason};
pub use period::{Period, UnknownPeriod, ONE_DAY_MS, ONE_HOUR_MS, ONE_MINUTE_MS};
pub use session::{BalanceLimits, HeartbeatConfig, SessionParameters, TimeRange};
pub use snapshot::{CurrentCandle, Cycle, EngineSnapshot, StrategyIndex};

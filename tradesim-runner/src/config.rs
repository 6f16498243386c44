//! Serializable session configuration, loaded from TOML.
//!
//! ```toml
//! time_frame = "01-hs"
//! initial_datetime = "2024-01-01T00:00:00Z"
//! final_datetime = "2024-03-01T00:00:00Z"
//!
//! [heartbeats]
//! date = true
//!
//! [quoted_asset]
//! initial_balance = 1000.0
//! minimum_balance = 100.0
//!
//! [[dependencies]]
//! category = "Multi-Period-Market"
//! singular = "bollinger"
//! plural = "bollingers"
//! period = "04-hs"
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradesim_core::domain::{
    BalanceLimits, DataDependency, DependencyCategory, EngineSnapshot, HeartbeatConfig, Period,
    SessionParameters, ONE_DAY_MS,
};
use tradesim_core::engine::AlignmentLayout;

/// Unique identifier for a session (content-addressable hash of its config).
pub type SessionId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-asset balances: the starting balance plus optional stop limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    #[serde(default)]
    pub initial_balance: f64,
    pub minimum_balance: Option<f64>,
    pub maximum_balance: Option<f64>,
}

impl AssetConfig {
    fn limits(&self) -> BalanceLimits {
        BalanceLimits {
            minimum_balance: self.minimum_balance,
            maximum_balance: self.maximum_balance,
        }
    }
}

/// Overrides of the period lists aligned in each pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_market_periods")]
    pub market_periods: Vec<Period>,
    #[serde(default = "default_daily_periods")]
    pub daily_periods: Vec<Period>,
}

fn default_market_periods() -> Vec<Period> {
    Period::MARKET.to_vec()
}

fn default_daily_periods() -> Vec<Period> {
    Period::DAILY.to_vec()
}

fn default_strategy_initial_index() -> i64 {
    -1
}

/// Everything needed to run (and re-run) one simulation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub time_frame: Period,
    pub initial_datetime: DateTime<Utc>,
    pub final_datetime: DateTime<Utc>,

    /// Datasets arrive as one chart file per UTC day.
    #[serde(default)]
    pub day_partitioned: bool,

    /// Strategy index value meaning "no position open".
    #[serde(default = "default_strategy_initial_index")]
    pub strategy_initial_index: i64,

    #[serde(default)]
    pub heartbeats: Option<HeartbeatConfig>,

    #[serde(default)]
    pub base_asset: AssetConfig,

    #[serde(default)]
    pub quoted_asset: AssetConfig,

    #[serde(default)]
    pub dependencies: Vec<DataDependency>,

    #[serde(default)]
    pub layout: Option<LayoutConfig>,
}

impl SessionConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.final_datetime < self.initial_datetime {
            return Err(ConfigError::Invalid(format!(
                "final_datetime {} is before initial_datetime {}",
                self.final_datetime, self.initial_datetime
            )));
        }

        for (name, asset) in [("base_asset", &self.base_asset), ("quoted_asset", &self.quoted_asset)] {
            if let (Some(min), Some(max)) = (asset.minimum_balance, asset.maximum_balance) {
                if min >= max {
                    return Err(ConfigError::Invalid(format!(
                        "{name}: minimum_balance {min} must be below maximum_balance {max}"
                    )));
                }
            }
        }

        for dep in &self.dependencies {
            if dep.singular.is_empty() || dep.plural.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "dependency {dep:?} needs both singular and plural names"
                )));
            }
            let daily_period = dep.period.map(Period::is_daily);
            match (dep.category, daily_period) {
                (DependencyCategory::MultiPeriodDaily, Some(false))
                | (DependencyCategory::MultiPeriodMarket, Some(true)) => {
                    return Err(ConfigError::Invalid(format!(
                        "dependency {} restricted to {}, which is not a {:?} period",
                        dep.plural,
                        dep.period.map(Period::label).unwrap_or_default(),
                        dep.category
                    )));
                }
                (DependencyCategory::SingleFile, Some(_)) => {
                    return Err(ConfigError::Invalid(format!(
                        "single-file dependency {} cannot be restricted to a period",
                        dep.plural
                    )));
                }
                _ => {}
            }
            if dep.category == DependencyCategory::MultiPeriodDaily && !self.day_partitioned {
                tracing::warn!(
                    plural = %dep.plural,
                    "daily dependency is never aligned without day_partitioned"
                );
            }
        }
        Ok(())
    }

    /// Deterministic hash of the config, used to name the session's output directory.
    pub fn session_id(&self) -> Result<SessionId, ConfigError> {
        let json = serde_json::to_string(self)?;
        let hash = blake3::hash(json.as_bytes());
        Ok(hash.to_hex().to_string())
    }

    pub fn session_parameters(&self) -> SessionParameters {
        let mut params = SessionParameters::new(
            self.time_frame,
            self.initial_datetime.timestamp_millis(),
            self.final_datetime.timestamp_millis(),
        )
        .day_partitioned(self.day_partitioned);
        params.heartbeats = self.heartbeats;
        params.base_asset = self.base_asset.limits();
        params.quoted_asset = self.quoted_asset.limits();
        params
    }

    pub fn alignment_layout(&self) -> AlignmentLayout {
        match &self.layout {
            Some(layout) => AlignmentLayout {
                market_periods: layout.market_periods.clone(),
                daily_periods: layout.daily_periods.clone(),
            },
            None => AlignmentLayout::default(),
        }
    }

    /// Snapshot for the first invocation of a session.
    ///
    /// The process date starts at the UTC midnight of the initial datetime.
    pub fn initial_snapshot(&self) -> EngineSnapshot {
        let initial = self.initial_datetime.timestamp_millis();
        EngineSnapshot::new(self.base_asset.initial_balance, self.quoted_asset.initial_balance)
            .with_strategy_initial_index(self.strategy_initial_index)
            .with_process_date(initial - initial.rem_euclid(ONE_DAY_MS))
    }
}

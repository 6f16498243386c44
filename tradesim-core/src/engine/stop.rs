//! Stop conditions — pure predicates over the snapshot and session parameters.
//!
//! Evaluated only at the safe point between the two cycles of a candle. The
//! post-cycle "next candle" check lives in [`super::advance`].

use crate::domain::{ChartElement, EngineSnapshot, ExitReason, SessionParameters};
use chrono::{DateTime, Utc};

use super::control::SessionController;

/// Result of a stop evaluation, consumed explicitly by the candle loop.
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    Continue,
    Stop {
        reason: ExitReason,
        /// Diagnostic for the trading system (balance breaches).
        detail: Option<String>,
    },
}

impl StopOutcome {
    pub fn stop(reason: ExitReason) -> Self {
        StopOutcome::Stop {
            reason,
            detail: None,
        }
    }

    pub fn reason(&self) -> Option<ExitReason> {
        match self {
            StopOutcome::Continue => None,
            StopOutcome::Stop { reason, .. } => Some(*reason),
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, StopOutcome::Stop { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    Base,
    Quoted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
}

/// A balance that crossed one of the configured limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceBreach {
    pub asset: Asset,
    pub bound: Bound,
    pub balance: f64,
    pub limit: f64,
}

/// Index of the first candle to process on a fresh run.
///
/// `None` means the session start lies beyond the last available candle:
/// the dataset is stale and must be refreshed before the session can run.
pub fn resolve_start_index(candles: &[ChartElement], params: &SessionParameters) -> Option<usize> {
    let first = candles.first()?;
    let diff = params.time_range.initial_datetime - first.end;
    // integer division truncates toward zero
    let index = (diff / params.time_frame_ms()).max(0) as usize;
    if index > candles.len() - 1 {
        None
    } else {
        Some(index)
    }
}

/// False for warm-up candles that end before the session's initial datetime.
pub fn is_within_initial_datetime(snapshot: &EngineSnapshot, params: &SessionParameters) -> bool {
    snapshot.candle.end >= params.time_range.initial_datetime
}

/// True when the candle after the current one would end past the final datetime.
pub fn final_datetime_reached(snapshot: &EngineSnapshot, params: &SessionParameters) -> bool {
    snapshot.candle.begin + params.time_frame_ms() > params.time_range.final_datetime
}

/// First breached balance limit, checked base min, base max, quoted min, quoted max.
///
/// Balances are only meaningful while the strategy is flat; while a position
/// is open they are displaced from their resting values and never breach.
pub fn balance_breach(snapshot: &EngineSnapshot, params: &SessionParameters) -> Option<BalanceBreach> {
    if !snapshot.is_flat() {
        return None;
    }

    let checks = [
        (Asset::Base, snapshot.base_asset_balance, &params.base_asset),
        (Asset::Quoted, snapshot.quoted_asset_balance, &params.quoted_asset),
    ];

    for (asset, balance, limits) in checks {
        if let Some(limit) = limits.minimum_balance {
            if balance <= limit {
                return Some(BalanceBreach {
                    asset,
                    bound: Bound::Min,
                    balance,
                    limit,
                });
            }
        }
        if let Some(limit) = limits.maximum_balance {
            if balance >= limit {
                return Some(BalanceBreach {
                    asset,
                    bound: Bound::Max,
                    balance,
                    limit,
                });
            }
        }
    }
    None
}

/// Stop checks run after cycle `First`, in priority order; first match wins.
pub fn evaluate_between_cycles(
    snapshot: &EngineSnapshot,
    params: &SessionParameters,
    controller: &dyn SessionController,
) -> StopOutcome {
    if controller.session_stop_requested() {
        return StopOutcome::stop(ExitReason::SessionStopped);
    }

    if controller.task_stop_requested() {
        return StopOutcome::stop(ExitReason::TaskStopped);
    }

    if final_datetime_reached(snapshot, params) {
        return StopOutcome::stop(ExitReason::FinalDatetimeReached);
    }

    if let Some(breach) = balance_breach(snapshot, params) {
        let bound = match breach.bound {
            Bound::Min => "Min",
            Bound::Max => "Max",
        };
        return StopOutcome::Stop {
            reason: ExitReason::MinOrMaxBalanceReached,
            detail: Some(format!(
                "{bound} Balance reached @ {}",
                format_timestamp(snapshot.candle.begin)
            )),
        };
    }

    StopOutcome::Continue
}

fn format_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

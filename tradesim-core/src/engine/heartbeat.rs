//! Heartbeat — throttled progress notifications while the loop runs.
//!
//! Date-only heartbeats fire once per simulated day. Candle-index heartbeats
//! fire on every candle.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{EngineSnapshot, SessionParameters};

use super::collaborators::ProgressSink;

/// Per-run heartbeat state.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    previous_day: Option<NaiveDate>,
    today: NaiveDate,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::with_today(Utc::now().date_naive())
    }

    /// Heartbeat whose notion of the wall-clock day is fixed.
    pub fn with_today(today: NaiveDate) -> Self {
        Self {
            previous_day: None,
            today,
        }
    }

    /// Emit the heartbeat for the candle the snapshot is standing at.
    pub fn beat(
        &mut self,
        snapshot: &EngineSnapshot,
        params: &SessionParameters,
        progress: &mut dyn ProgressSink,
    ) {
        let Some(flags) = params.heartbeats.filter(|h| h.is_enabled()) else {
            return;
        };
        let Some(day) = utc_day(snapshot.candle.begin) else {
            return;
        };

        let percentage = progress_percentage(
            day,
            utc_day(params.time_range.initial_datetime),
            utc_day(params.time_range.final_datetime),
        );
        let day_text = day.format("%Y-%m-%d").to_string();

        if self.previous_day != Some(day) {
            self.previous_day = Some(day);
            tracing::info!(
                index = snapshot.candle.index,
                day = %day_text,
                percentage,
                "simulation loop"
            );

            // the wall-clock day is being reported live elsewhere
            if day != self.today {
                progress.new_internal_loop(day, percentage);
            }

            if flags.date && !flags.candle_index {
                progress.heartbeat(&day_text, percentage);
                return;
            }
        }

        if flags.candle_index {
            // without the date prefix the text keeps its leading space
            let prefix = if flags.date { day_text.as_str() } else { "" };
            let text = format!("{prefix} Candle # {}", snapshot.candle.index);
            progress.heartbeat(&text, percentage);
        }
    }
}

/// Position of `day` between the session start and end days, in percent.
pub fn progress_percentage(day: NaiveDate, from: Option<NaiveDate>, last: Option<NaiveDate>) -> f64 {
    let (Some(from), Some(last)) = (from, last) else {
        return 0.0;
    };
    let span = (last - from).num_days();
    if span <= 0 {
        return 100.0;
    }
    let done = (day - from).num_days();
    (done as f64 * 100.0 / span as f64).clamp(0.0, 100.0)
}

fn utc_day(ms: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|d| d.date_naive())
}

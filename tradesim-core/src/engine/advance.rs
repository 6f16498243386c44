//! Next-candle logic — advances the snapshot index after a candle completes
//! and decides whether the loop may continue.
//!
//! The last candle of a dataset is still forming and is never processed, so
//! "no next candle" is signalled once the second-to-last one is done.

use crate::domain::{EngineSnapshot, SessionParameters};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// More closed candles follow.
    Next,
    /// Standing at the head of the market. The index still moves forward so
    /// the next invocation resumes at the right candle once data arrives.
    HeadOfTheMarket,
    /// End of a day-partitioned dataset: the index wraps to 0 and the process
    /// date moves to the next day, whose dataset the next invocation receives.
    DayRollover,
}

impl Advance {
    pub fn has_next(self) -> bool {
        matches!(self, Advance::Next)
    }
}

/// Advance `snapshot` past its current candle in a dataset of `candle_count` candles.
pub fn advance_candle(
    snapshot: &mut EngineSnapshot,
    candle_count: usize,
    params: &SessionParameters,
) -> Advance {
    let next_is_last = snapshot.candle.index + 2 == candle_count;
    if !next_is_last {
        snapshot.head_of_the_market = false;
        snapshot.candle.index += 1;
        return Advance::Next;
    }

    let candles_per_day = params.time_frame.candles_per_day();
    if params.day_partitioned && (snapshot.candle.index + 2) as i64 == candles_per_day {
        snapshot.candle.index = 0;
        snapshot.advance_process_date();
        return Advance::DayRollover;
    }

    snapshot.head_of_the_market = true;
    snapshot.candle.index += 1;
    Advance::HeadOfTheMarket
}

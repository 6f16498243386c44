//! Episode — one lifecycle span of a simulation run and why it ended.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason a simulation loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    #[serde(rename = "Session Stopped")]
    SessionStopped,
    #[serde(rename = "Task Stopped")]
    TaskStopped,
    #[serde(rename = "Final Datetime Reached")]
    FinalDatetimeReached,
    #[serde(rename = "Min or Max Balance Reached")]
    MinOrMaxBalanceReached,
    #[serde(rename = "All Available Candles Processed")]
    AllAvailableCandlesProcessed,
    /// The session start lies beyond the last candle of the dataset.
    #[serde(rename = "Data Not Up To Date")]
    StaleData,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::SessionStopped => "Session Stopped",
            ExitReason::TaskStopped => "Task Stopped",
            ExitReason::FinalDatetimeReached => "Final Datetime Reached",
            ExitReason::MinOrMaxBalanceReached => "Min or Max Balance Reached",
            ExitReason::AllAvailableCandlesProcessed => "All Available Candles Processed",
            ExitReason::StaleData => "Data Not Up To Date",
        }
    }

    /// Whether this reason asks the session controller to stop the session.
    pub fn stops_session(self) -> bool {
        matches!(
            self,
            ExitReason::FinalDatetimeReached
                | ExitReason::MinOrMaxBalanceReached
                | ExitReason::StaleData
        )
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeState {
    #[default]
    NotOpened,
    Open,
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub state: EpisodeState,
    pub exit_type: Option<ExitReason>,
    /// Begin of the candle the episode was opened at.
    pub opened_at: Option<i64>,
    /// Begin of the candle the episode was closed at.
    pub closed_at: Option<i64>,
}

impl Episode {
    pub fn open(&mut self, at: i64) {
        self.state = EpisodeState::Open;
        self.opened_at = Some(at);
        self.closed_at = None;
    }

    pub fn close(&mut self, at: i64) {
        self.state = EpisodeState::Closed;
        self.closed_at = Some(at);
    }

    pub fn is_open(&self) -> bool {
        self.state == EpisodeState::Open
    }
}

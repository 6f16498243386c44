//! Progress sink that forwards heartbeats to `tracing`.

use chrono::NaiveDate;
use tradesim_core::engine::ProgressSink;

#[derive(Debug, Default)]
pub struct TracingProgress {
    heartbeats: usize,
    days: usize,
    percentage: f64,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heartbeats(&self) -> usize {
        self.heartbeats
    }

    /// Simulated days started.
    pub fn days(&self) -> usize {
        self.days
    }

    /// Last reported progress percentage.
    pub fn percentage(&self) -> f64 {
        self.percentage
    }
}

impl ProgressSink for TracingProgress {
    fn heartbeat(&mut self, text: &str, percentage: f64) {
        self.heartbeats += 1;
        self.percentage = percentage;
        tracing::info!(percentage, "{text}");
    }

    fn new_internal_loop(&mut self, day: NaiveDate, percentage: f64) {
        self.days += 1;
        self.percentage = percentage;
        tracing::debug!(%day, percentage, "processing day");
    }
}

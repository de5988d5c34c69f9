use std::time::{Duration, Instant};

/// Timestamps of one commit and of the diff that mounted it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransactionTelemetry {
    commit_start: Option<Instant>,
    commit_end: Option<Instant>,
    diff_start: Option<Instant>,
    diff_end: Option<Instant>,
}

impl TransactionTelemetry {
    pub fn will_commit(&mut self) {
        self.commit_start = Some(Instant::now());
    }

    pub fn did_commit(&mut self) {
        self.commit_end = Some(Instant::now());
    }

    pub fn will_diff(&mut self) {
        self.diff_start = Some(Instant::now());
    }

    pub fn did_diff(&mut self) {
        self.diff_end = Some(Instant::now());
    }

    pub fn commit_duration(&self) -> Option<Duration> {
        Some(self.commit_end?.saturating_duration_since(self.commit_start?))
    }

    pub fn diff_duration(&self) -> Option<Duration> {
        Some(self.diff_end?.saturating_duration_since(self.diff_start?))
    }
}

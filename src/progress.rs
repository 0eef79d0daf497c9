//! Throughput reporting.
//!
//! The reporter never touches the workers: it is handed snapshots of the
//! shared attempt counter and decides whether a progress line is due.

use std::fmt;
use std::time::{Duration, Instant};

/// How often progress is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressInterval {
    /// Once per wall-clock period.
    Every(Duration),
    /// Each time the attempt count crosses a multiple of this threshold.
    Attempts(u64),
}

impl Default for ProgressInterval {
    fn default() -> Self {
        ProgressInterval::Every(Duration::from_secs(1))
    }
}

impl fmt::Display for ProgressInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressInterval::Every(period) => write!(f, "every {:.1}s", period.as_secs_f64()),
            ProgressInterval::Attempts(n) => write!(f, "every {} keys", format_number(*n)),
        }
    }
}

/// A point-in-time view of search throughput.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub attempts: u64,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Attempts per second since the search started.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.attempts as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>4}s] Generated {} wallets ({}/s)",
            self.elapsed.as_secs(),
            format_number(self.attempts),
            format_number(self.rate() as u64)
        )
    }
}

/// Decides when a progress line is due.
#[derive(Debug)]
pub struct ProgressReporter {
    interval: ProgressInterval,
    start: Instant,
    last_report: Instant,
    last_bucket: u64,
}

impl ProgressReporter {
    pub fn starting_at(interval: ProgressInterval, start: Instant) -> Self {
        Self {
            interval,
            start,
            last_report: start,
            last_bucket: 0,
        }
    }

    /// Feeds a counter snapshot taken at `now`.
    ///
    /// Returns a snapshot to report when the cadence says one is due.
    pub fn observe(&mut self, attempts: u64, now: Instant) -> Option<ProgressSnapshot> {
        let due = match self.interval {
            ProgressInterval::Every(period) => {
                if now.saturating_duration_since(self.last_report) >= period {
                    self.last_report = now;
                    true
                } else {
                    false
                }
            }
            ProgressInterval::Attempts(threshold) => {
                let bucket = attempts / threshold.max(1);
                if bucket > self.last_bucket {
                    self.last_bucket = bucket;
                    true
                } else {
                    false
                }
            }
        };

        due.then(|| ProgressSnapshot {
            attempts,
            elapsed: now.saturating_duration_since(self.start),
        })
    }
}

/// Formats a count with a K/M/B suffix.
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

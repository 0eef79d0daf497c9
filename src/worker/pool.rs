//! Worker pool management and search coordination.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, SearchConfig};
use crate::matcher::Pattern;
use crate::progress::{ProgressReporter, ProgressSnapshot};

use super::cancel::CancelToken;
use super::cpu::{CpuWorker, WorkerState, WorkerStats};

/// Upper bound on how long the coordinator sleeps before re-checking the
/// interrupt flag, the deadline, and the progress cadence.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A keypair whose address satisfied the pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Checksummed address with 0x prefix
    pub address: String,
    /// Private key, 0x-prefixed hex
    pub private_key: String,
    /// The ID of the worker that found this result
    pub worker_id: usize,
}

impl fmt::Debug for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchResult")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .field("worker_id", &self.worker_id)
            .finish()
    }
}

/// How a search ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(MatchResult),
    Interrupted,
    TimedOut,
}

/// Final accounting of a completed search.
#[derive(Debug, Clone)]
pub struct SearchSummary {
    pub outcome: SearchOutcome,
    pub total_attempts: u64,
    pub elapsed: Duration,
    /// Workers that reached the cancelled state and were joined
    pub workers_joined: usize,
    /// Matches that arrived after the first one and were dropped
    pub discarded_matches: usize,
}

impl SearchSummary {
    /// Average attempts per second over the whole run.
    pub fn keys_per_second(&self) -> f64 {
        ProgressSnapshot {
            attempts: self.total_attempts,
            elapsed: self.elapsed,
        }
        .rate()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Owns the workers, the cancellation broadcast, the result channel, and the
/// shared attempt counter.
pub struct WorkerPool {
    config: Arc<SearchConfig>,
    /// Worker thread handles (Option to allow taking during join)
    handles: Option<Vec<JoinHandle<WorkerState>>>,
    result_rx: Receiver<MatchResult>,
    cancel: CancelToken,
    stats: Arc<WorkerStats>,
    start_time: Instant,
}

impl WorkerPool {
    /// Validates `config` and starts `config.concurrency` workers.
    ///
    /// Nothing is spawned if the configuration is rejected.
    pub fn start(config: SearchConfig) -> Result<Self, PoolError> {
        Self::start_with_cancel(config, CancelToken::new())
    }

    /// Like [`WorkerPool::start`], observing an externally owned token
    /// (e.g. one already wired to the interrupt handler).
    pub fn start_with_cancel(config: SearchConfig, cancel: CancelToken) -> Result<Self, PoolError> {
        config.validate()?;

        let config = Arc::new(config);
        let pattern = Arc::new(config.pattern());
        // One slot per worker so no worker ever blocks handing over a match
        let (result_tx, result_rx) = bounded(config.concurrency);
        let stats = Arc::new(WorkerStats::new());

        let handles = Self::spawn_workers(&config, &pattern, result_tx, &cancel, &stats)?;

        info!(
            workers = config.concurrency,
            batch_size = config.batch_size,
            pattern = %pattern,
            "search started"
        );

        Ok(Self {
            config,
            handles: Some(handles),
            result_rx,
            cancel,
            stats,
            start_time: Instant::now(),
        })
    }

    /// Spawns worker threads.
    ///
    /// If a spawn fails, already running workers are cancelled and joined
    /// before the error is returned.
    fn spawn_workers(
        config: &SearchConfig,
        pattern: &Arc<Pattern>,
        result_tx: Sender<MatchResult>,
        cancel: &CancelToken,
        stats: &Arc<WorkerStats>,
    ) -> Result<Vec<JoinHandle<WorkerState>>, PoolError> {
        let mut handles = Vec::with_capacity(config.concurrency);

        for id in 0..config.concurrency {
            let worker = CpuWorker::new(
                id,
                pattern.clone(),
                config.batch_size,
                result_tx.clone(),
                cancel.clone(),
                stats.clone(),
            );

            let spawned = thread::Builder::new()
                .name(format!("vanity-worker-{}", id))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    cancel.cancel();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(e.into());
                }
            }
        }

        Ok(handles)
    }

    /// Coordinates the search until a match, an interrupt, or the deadline.
    ///
    /// `on_progress` is called whenever the configured cadence is due. All
    /// workers are joined before this returns.
    pub fn run<F>(mut self, mut on_progress: F) -> SearchSummary
    where
        F: FnMut(&ProgressSnapshot),
    {
        let mut reporter = ProgressReporter::starting_at(self.config.progress, self.start_time);
        // A timeout too large to represent as an instant never expires
        let deadline = self
            .config
            .timeout
            .and_then(|t| self.start_time.checked_add(t));

        let outcome = loop {
            let wait = match deadline {
                Some(d) => POLL_INTERVAL.min(d.saturating_duration_since(Instant::now())),
                None => POLL_INTERVAL,
            };

            match self.result_rx.recv_timeout(wait) {
                Ok(result) => {
                    self.cancel.cancel();
                    info!(worker = result.worker_id, address = %result.address, "match found");
                    break SearchOutcome::Found(result);
                }
                Err(RecvTimeoutError::Timeout) => {}
                // Every worker exited without a match
                Err(RecvTimeoutError::Disconnected) => break SearchOutcome::Interrupted,
            }

            if let Some(snapshot) = reporter.observe(self.total_attempts(), Instant::now()) {
                on_progress(&snapshot);
            }

            if self.cancel.is_cancelled() {
                info!("search interrupted");
                break SearchOutcome::Interrupted;
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                self.cancel.cancel();
                info!("search timed out");
                break SearchOutcome::TimedOut;
            }
        };

        let workers_joined = self.join();

        // A match that raced with an interrupt or the deadline is still
        // reported; anything after the first is dropped.
        let mut late = self.result_rx.try_iter();
        let (outcome, discarded_matches) = match outcome {
            SearchOutcome::Found(result) => (SearchOutcome::Found(result), late.count()),
            other => match late.next() {
                Some(result) => (SearchOutcome::Found(result), late.count()),
                None => (other, 0),
            },
        };

        if discarded_matches > 0 {
            warn!(discarded_matches, "discarded matches found after the first");
        }

        SearchSummary {
            outcome,
            total_attempts: self.total_attempts(),
            elapsed: self.elapsed(),
            workers_joined,
            discarded_matches,
        }
    }

    /// Broadcasts cancellation to all workers.
    pub fn cancel(&self) {
        if self.cancel.cancel() {
            debug!("cancellation broadcast");
        }
    }

    /// Cancels and waits for every worker to finish.
    ///
    /// Returns the number of workers that ended in the cancelled state.
    pub fn join(&mut self) -> usize {
        self.cancel();
        let Some(handles) = self.handles.take() else {
            return 0;
        };

        handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .filter(|state| *state == WorkerState::Cancelled)
            .count()
    }

    /// Returns the total keys tested across all workers.
    pub fn total_attempts(&self) -> u64 {
        self.stats.total_attempts()
    }

    /// Returns the elapsed time since the pool was started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join();
    }
}

//! CPU-based search worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Sender, TrySendError};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, warn};

use crate::crypto::KeyGenerator;
use crate::matcher::Pattern;

use super::{CancelToken, MatchResult};

/// Counters shared by every worker of a pool.
///
/// `attempts` grows by one for every candidate tested; it is only ever read
/// for reporting.
#[derive(Debug, Default)]
pub struct WorkerStats {
    attempts: AtomicU64,
    matches_found: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_match(&self) {
        self.matches_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn total_matches(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }
}

/// Lifecycle of a worker. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Cancelled,
}

/// A worker that generates keypairs and tests them against the pattern.
pub struct CpuWorker<R = OsRng> {
    id: usize,
    pattern: Arc<Pattern>,
    batch_size: usize,
    generator: KeyGenerator<R>,
    result_tx: Sender<MatchResult>,
    cancel: CancelToken,
    stats: Arc<WorkerStats>,
    state: WorkerState,
    attempts: u64,
}

impl CpuWorker<OsRng> {
    pub fn new(
        id: usize,
        pattern: Arc<Pattern>,
        batch_size: usize,
        result_tx: Sender<MatchResult>,
        cancel: CancelToken,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self::with_generator(
            id,
            pattern,
            batch_size,
            KeyGenerator::new(),
            result_tx,
            cancel,
            stats,
        )
    }
}

impl<R: RngCore> CpuWorker<R> {
    /// Builds a worker that draws candidates from `generator`.
    pub fn with_generator(
        id: usize,
        pattern: Arc<Pattern>,
        batch_size: usize,
        generator: KeyGenerator<R>,
        result_tx: Sender<MatchResult>,
        cancel: CancelToken,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            pattern,
            batch_size: batch_size.max(1),
            generator,
            result_tx,
            cancel,
            stats,
            state: WorkerState::Running,
            attempts: 0,
        }
    }

    /// Runs batches until the worker is cancelled.
    ///
    /// Stops after emitting a match or once the cancellation token is seen
    /// between batches.
    pub fn run(mut self) -> WorkerState {
        debug!(worker = self.id, "worker started");
        while self.run_batch() == WorkerState::Running {}
        debug!(worker = self.id, attempts = self.attempts, "worker exited");
        self.state
    }

    /// Checks for cancellation, then tries up to `batch_size` candidates.
    pub fn run_batch(&mut self) -> WorkerState {
        if self.state == WorkerState::Cancelled {
            return self.state;
        }
        if self.cancel.is_cancelled() {
            self.state = WorkerState::Cancelled;
            return self.state;
        }

        for _ in 0..self.batch_size {
            let keypair = match self.generator.generate() {
                Ok(keypair) => keypair,
                Err(e) => {
                    debug!(worker = self.id, error = %e, "skipping attempt");
                    continue;
                }
            };

            self.attempts += 1;
            self.stats.record_attempt();

            let address = keypair.address().to_checksum();
            if self.pattern.matches(&address) {
                self.stats.record_match();
                self.emit(MatchResult {
                    address,
                    private_key: keypair.private_key_hex(),
                    worker_id: self.id,
                });
                self.state = WorkerState::Cancelled;
                break;
            }
        }

        self.state
    }

    /// Deposits a match without blocking; the channel is sized so every
    /// worker has a slot.
    fn emit(&self, result: MatchResult) {
        match self.result_tx.try_send(result) {
            Ok(()) => {}
            Err(TrySendError::Full(result)) => {
                warn!(
                    worker = self.id,
                    address = %result.address,
                    "result channel full, dropping match"
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!(worker = self.id, "coordinator gone, dropping match");
            }
        }
    }

    /// Candidates tested by this worker.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }
}

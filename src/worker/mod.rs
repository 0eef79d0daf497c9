//! Worker pool for parallel vanity address search.
//!
//! This module provides:
//! - Multi-threaded CPU workers that test candidates in batches
//! - A set-once cancellation broadcast polled between batches
//! - The coordinator that collects the first match and joins every worker

mod cancel;
mod cpu;
mod pool;

pub use cancel::CancelToken;
pub use cpu::{CpuWorker, WorkerState, WorkerStats};
pub use pool::{MatchResult, PoolError, SearchOutcome, SearchSummary, WorkerPool};

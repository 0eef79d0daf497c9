//! # vanity_wallet
//!
//! Ethereum vanity wallet miner.
//!
//! ## Architecture
//!
//! - `crypto`: Key generation and address derivation
//! - `matcher`: Prefix/suffix matching
//! - `worker`: Worker pool, cancellation, and search coordination
//! - `progress`: Throughput reporting
//! - `protect`: RSA-OAEP sealing of found keys
//! - `notify`: Console and webhook delivery
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod notify;
pub mod progress;
pub mod protect;
pub mod worker;

pub use config::{Config, ConfigError, Mode, SearchConfig};
pub use crypto::{Address, KeyGenerator, Keypair};
pub use matcher::Pattern;
pub use notify::{ConsoleNotifier, Message, Notifier, WebhookNotifier};
pub use progress::{ProgressInterval, ProgressReporter, ProgressSnapshot};
pub use protect::{decrypt, encrypt, Opener, ProtectError, Sealer};
pub use worker::{CancelToken, MatchResult, SearchOutcome, SearchSummary, WorkerPool};

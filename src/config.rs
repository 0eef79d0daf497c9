//! Runtime configuration.
//!
//! Command-line flags are parsed once into [`Config`], validated, and turned
//! into an immutable [`SearchConfig`] shared by the coordinator and workers.

use std::time::Duration;

use clap::Parser;

use crate::matcher::Pattern;
use crate::progress::ProgressInterval;

/// Longest pattern, in hex digits, that fits in an address.
const ADDRESS_HEX_DIGITS: usize = 40;

/// Ethereum vanity wallet miner
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Required address prefix, including the leading 0x
    #[arg(short, long, default_value = "0x0000")]
    pub prefix: String,

    /// Required address suffix (hex characters only)
    #[arg(short, long, default_value = "")]
    pub suffix: String,

    /// Number of worker threads (default: available cores minus one)
    #[arg(short = 'w', long)]
    pub concurrency: Option<usize>,

    /// Keys each worker tries between cancellation checks
    #[arg(short, long, default_value = "10")]
    pub batch_size: usize,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "1")]
    pub log_interval: u64,

    /// Report progress every N keys instead of on a timer
    #[arg(long)]
    pub log_every: Option<u64>,

    /// Compare prefix and suffix ignoring the EIP-55 letter case
    #[arg(short = 'i', long, default_value = "false")]
    pub case_insensitive: bool,

    /// Give up after this many seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Base64-encoded PEM RSA public key; found keys are encrypted with it
    #[arg(long)]
    pub encryption_public_key: Option<String>,

    /// Base64-encoded PEM RSA private key; decrypts --ciphertext and exits
    #[arg(long)]
    pub decryption_private_key: Option<String>,

    /// Base64 ciphertext produced by an earlier run
    #[arg(long)]
    pub ciphertext: Option<String>,

    /// Webhook URL that receives the result instead of the console
    #[arg(long)]
    pub webhook_url: Option<String>,

    /// Log filter (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// What the process was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Mine a vanity address.
    Search,
    /// Decrypt a previously delivered ciphertext offline.
    Decrypt {
        private_key: String,
        ciphertext: String,
    },
}

impl Config {
    /// Returns the number of workers, defaulting to all cores but one.
    pub fn worker_count(&self) -> usize {
        self.concurrency.unwrap_or_else(default_concurrency)
    }

    pub fn progress_interval(&self) -> ProgressInterval {
        match self.log_every {
            Some(n) => ProgressInterval::Attempts(n),
            None => ProgressInterval::Every(Duration::from_secs(self.log_interval)),
        }
    }

    pub fn encryption_key(&self) -> Option<&str> {
        non_empty(&self.encryption_public_key)
    }

    pub fn webhook(&self) -> Option<&str> {
        non_empty(&self.webhook_url)
    }

    /// Returns the operating mode.
    pub fn mode(&self) -> Mode {
        match (
            non_empty(&self.decryption_private_key),
            non_empty(&self.ciphertext),
        ) {
            (Some(private_key), Some(ciphertext)) => Mode::Decrypt {
                private_key: private_key.to_string(),
                ciphertext: ciphertext.to_string(),
            },
            _ => Mode::Search,
        }
    }

    /// Builds the immutable search configuration.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            case_sensitive: !self.case_insensitive,
            concurrency: self.worker_count(),
            batch_size: self.batch_size,
            progress: self.progress_interval(),
            timeout: self.timeout.map(Duration::from_secs),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let decrypt_key = non_empty(&self.decryption_private_key);
        let ciphertext = non_empty(&self.ciphertext);

        if self.encryption_key().is_some() && decrypt_key.is_some() {
            return Err(ConfigError::ConflictingModes);
        }

        match (decrypt_key, ciphertext) {
            (Some(_), None) => return Err(ConfigError::MissingCiphertext),
            (None, Some(_)) => return Err(ConfigError::MissingDecryptionKey),
            (Some(_), Some(_)) => return Ok(()),
            (None, None) => {}
        }

        if let Some(url) = self.webhook() {
            reqwest::Url::parse(url)
                .map_err(|e| ConfigError::InvalidWebhookUrl(format!("{}: {}", url, e)))?;
        }

        self.search_config().validate()
    }
}

/// Immutable parameters of one search, shared by the coordinator and workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub prefix: String,
    pub suffix: String,
    pub case_sensitive: bool,
    pub concurrency: usize,
    pub batch_size: usize,
    pub progress: ProgressInterval,
    pub timeout: Option<Duration>,
}

impl SearchConfig {
    /// A case-sensitive search with default tuning.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            case_sensitive: true,
            concurrency: default_concurrency(),
            batch_size: 10,
            progress: ProgressInterval::default(),
            timeout: None,
        }
    }

    pub fn pattern(&self) -> Pattern {
        Pattern::new(self.prefix.clone(), self.suffix.clone(), self.case_sensitive)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(self.concurrency));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        match self.progress {
            ProgressInterval::Every(period) if period.is_zero() => {
                return Err(ConfigError::InvalidLogInterval);
            }
            ProgressInterval::Attempts(0) => return Err(ConfigError::InvalidLogInterval),
            _ => {}
        }

        // Every address begins with "0x", so the prefix must agree with it
        let prefix_digits = if "0x".starts_with(self.prefix.as_str()) {
            ""
        } else {
            self.prefix.strip_prefix("0x").ok_or_else(|| {
                ConfigError::InvalidPattern("Prefix must start with 0x".into())
            })?
        };

        if !prefix_digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidPattern(
                "Prefix must contain only hex characters (0-9, a-f, A-F) after 0x".into(),
            ));
        }

        if !self.suffix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidPattern(
                "Suffix must contain only hex characters (0-9, a-f, A-F)".into(),
            ));
        }

        if prefix_digits.len() + self.suffix.len() > ADDRESS_HEX_DIGITS {
            return Err(ConfigError::InvalidPattern(
                "Combined prefix + suffix cannot be longer than 40 hex characters".into(),
            ));
        }

        Ok(())
    }
}

/// Available parallelism minus one core for the coordinator, at least one.
pub fn default_concurrency() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid concurrency {0}: at least one worker is required")]
    InvalidConcurrency(usize),

    #[error("Invalid batch size {0}: must be at least 1")]
    InvalidBatchSize(usize),

    #[error("Invalid log interval: must be greater than zero")]
    InvalidLogInterval,

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid webhook URL {0}")]
    InvalidWebhookUrl(String),

    #[error("--encryption-public-key and --decryption-private-key are mutually exclusive")]
    ConflictingModes,

    #[error("--decryption-private-key requires --ciphertext")]
    MissingCiphertext,

    #[error("--ciphertext requires --decryption-private-key")]
    MissingDecryptionKey,
}

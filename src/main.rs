//! Ethereum Vanity Wallet Miner CLI
//!
//! Usage:
//!   vanity_wallet -p 0xdead                      # Address starting with "0xdead"
//!   vanity_wallet -p 0x -s beef -i               # Ending with "beef", any case
//!   vanity_wallet --encryption-public-key <b64>  # Deliver the key RSA-encrypted
//!   vanity_wallet --decryption-private-key <b64> --ciphertext <b64>

use std::process;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use vanity_wallet::notify::{self, ConsoleNotifier, Notifier, WebhookNotifier};
use vanity_wallet::progress::format_number;
use vanity_wallet::{CancelToken, Config, Mode, Opener, SearchOutcome, Sealer, WorkerPool};

fn main() {
    let config = Config::parse();
    init_tracing(&config.log_level);

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    let code = match config.mode() {
        Mode::Decrypt {
            private_key,
            ciphertext,
        } => run_decrypt(&private_key, &ciphertext),
        Mode::Search => run_search(&config),
    };
    process::exit(code);
}

/// Logs go to stderr so stdout carries only operator output.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .init();
}

fn run_decrypt(private_key: &str, ciphertext: &str) -> i32 {
    let opened = Opener::from_encoded(Some(private_key)).and_then(|opener| opener.open(ciphertext));
    match opened {
        Ok(plaintext) => {
            println!("{}", plaintext);
            0
        }
        Err(e) => {
            eprintln!("Decryption error: {}", e);
            1
        }
    }
}

fn run_search(config: &Config) -> i32 {
    // Fail on a bad key before spending any time searching
    let sealer = match Sealer::from_encoded(config.encryption_key()) {
        Ok(sealer) => sealer,
        Err(e) => {
            eprintln!("Encryption key error: {}", e);
            return 1;
        }
    };

    let notifier: Box<dyn Notifier> = match config.webhook() {
        Some(url) => match WebhookNotifier::new(url) {
            Ok(webhook) => Box::new(webhook),
            Err(e) => {
                eprintln!("Webhook setup error: {}", e);
                return 1;
            }
        },
        None => Box::new(ConsoleNotifier),
    };

    let search = config.search_config();
    let pattern = search.pattern();

    // Print startup info
    println!("Ethereum Vanity Wallet Miner");
    println!("============================");
    println!("Pattern:    {}", pattern);
    println!("Difficulty: {}", pattern.difficulty_description());
    println!("Workers:    {}", search.concurrency);
    println!("Batch size: {}", search.batch_size);
    println!("Progress:   {}", search.progress);
    println!(
        "Delivery:   {}{}",
        config.webhook().map_or("console", |_| "webhook"),
        if sealer.is_encrypting() { " (RSA-OAEP encrypted)" } else { "" }
    );
    println!();

    // Set up ctrl-c handler before any worker runs
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        handler_token.cancel();
    }) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }

    let pool = match WorkerPool::start_with_cancel(search, cancel) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to start search: {}", e);
            return 1;
        }
    };

    println!("Searching... (Press Ctrl+C to stop)\n");

    let summary = pool.run(|snapshot| println!("{}", snapshot));

    // Print final stats
    println!("\n--- Final Statistics ---");
    println!("Total wallets generated: {}", format_number(summary.total_attempts));
    println!("Time elapsed:            {:.2}s", summary.elapsed.as_secs_f64());
    println!(
        "Average speed:           {}/s",
        format_number(summary.keys_per_second() as u64)
    );
    println!();

    match summary.outcome {
        SearchOutcome::Found(result) => {
            println!("=== Match (worker {}) ===", result.worker_id);
            match notify::publish(&result, &sealer, notifier.as_ref()) {
                Ok(_) => 0,
                Err(e) => {
                    eprintln!("Failed to protect key for {}: {}", result.address, e);
                    1
                }
            }
        }
        SearchOutcome::Interrupted => {
            println!("Stopped by user.");
            0
        }
        SearchOutcome::TimedOut => {
            println!("Timed out without a match.");
            0
        }
    }
}

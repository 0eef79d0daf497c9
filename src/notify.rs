//! Delivery of the final result to the operator.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::protect::{ProtectError, Sealer};
use crate::worker::MatchResult;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Payload delivered to a notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub content: String,
}

impl Message {
    /// Builds the result message. `protected_key` is whatever the protection
    /// step produced: ciphertext, or the plain key if no encryption is set.
    pub fn found(address: &str, protected_key: &str) -> Self {
        Self {
            content: format!("Wallet Address: {}\nPrivate Key: {}", address, protected_key),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook returned status {0}")]
    Status(reqwest::StatusCode),
}

/// A destination for the final message.
pub trait Notifier {
    fn notify(&self, message: &Message) -> Result<(), NotifyError>;
}

/// Prints the message to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &Message) -> Result<(), NotifyError> {
        println!("{}", message.content);
        Ok(())
    }
}

/// Posts the message as JSON to a webhook (Discord-compatible body).
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, message: &Message) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/json; charset=utf-8",
            )
            .json(message)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }
        Ok(())
    }
}

/// Sends `message`, printing it to the console if the notifier fails.
///
/// Returns whether the primary notifier accepted the message.
pub fn deliver(notifier: &dyn Notifier, message: &Message) -> bool {
    match notifier.notify(message) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "notification failed, printing result to console");
            let _ = ConsoleNotifier.notify(message);
            false
        }
    }
}

/// Protects the found key and hands the result to `notifier`.
///
/// Nothing is delivered if protection fails, so an unencrypted key never
/// leaks when encryption was requested.
pub fn publish(
    result: &MatchResult,
    sealer: &Sealer,
    notifier: &dyn Notifier,
) -> Result<Message, ProtectError> {
    let protected = sealer.seal(&result.private_key)?;
    let message = Message::found(&result.address, &protected);
    if deliver(notifier, &message) {
        info!(address = %result.address, encrypted = sealer.is_encrypting(), "result delivered");
    }
    Ok(message)
}

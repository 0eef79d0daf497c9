//! End-to-end search scenarios through the public API.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use clap::Parser;
use rand::rngs::OsRng;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::RsaPrivateKey;

use vanity_wallet::matcher;
use vanity_wallet::notify::{self, Message, Notifier, WebhookNotifier};
use vanity_wallet::worker::PoolError;
use vanity_wallet::{
    decrypt, encrypt, Config, ConfigError, Keypair, SearchConfig, SearchOutcome, Sealer,
    WorkerPool,
};

fn find(prefix: &str, concurrency: usize) -> vanity_wallet::MatchResult {
    let config = SearchConfig {
        concurrency,
        ..SearchConfig::new(prefix, "")
    };
    let summary = WorkerPool::start(config).unwrap().run(|_| {});
    assert_eq!(summary.workers_joined, concurrency);
    match summary.outcome {
        SearchOutcome::Found(result) => result,
        other => panic!("expected a match, got {:?}", other),
    }
}

#[test]
fn test_prefix_search_reports_matching_key() {
    let result = find("0xAA", 4);

    assert!(result.address.starts_with("0xAA"), "{}", result.address);
    assert!(matcher::matches(&result.address, "0xAA", ""));

    // The reported key really derives the reported address
    let secret: [u8; 32] = hex::decode(&result.private_key[2..])
        .unwrap()
        .try_into()
        .unwrap();
    let keypair = Keypair::from_secret_bytes(secret).unwrap();
    assert_eq!(keypair.address().to_checksum(), result.address);

    // Without encryption the key survives the pipeline unchanged
    let passed_through = encrypt("", &result.private_key).unwrap();
    assert_eq!(decrypt("", &passed_through).unwrap(), result.private_key);
}

#[test]
fn test_suffix_and_case_insensitive_search() {
    let config = SearchConfig {
        concurrency: 2,
        case_sensitive: false,
        ..SearchConfig::new("0x", "ab")
    };
    let summary = WorkerPool::start(config).unwrap().run(|_| {});
    match summary.outcome {
        SearchOutcome::Found(result) => {
            assert!(result.address.to_lowercase().ends_with("ab"), "{}", result.address)
        }
        other => panic!("expected a match, got {:?}", other),
    }
}

#[test]
fn test_encrypted_key_round_trip() {
    let private = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
    let public_b64 = BASE64.encode(
        private
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap(),
    );
    let private_b64 = BASE64.encode(private.to_pkcs1_pem(LineEnding::LF).unwrap().as_bytes());

    let result = find("0x0", 2);
    let sealer = Sealer::from_encoded(Some(&public_b64)).unwrap();

    struct Capture(std::cell::RefCell<Option<Message>>);
    impl Notifier for Capture {
        fn notify(&self, message: &Message) -> Result<(), notify::NotifyError> {
            *self.0.borrow_mut() = Some(message.clone());
            Ok(())
        }
    }

    let capture = Capture(Default::default());
    let message = notify::publish(&result, &sealer, &capture).unwrap();
    assert_eq!(capture.0.borrow().as_ref(), Some(&message));
    assert!(!message.content.contains(&result.private_key));

    let ciphertext = message
        .content
        .strip_prefix(&format!("Wallet Address: {}\nPrivate Key: ", result.address))
        .unwrap();
    assert_eq!(decrypt(&private_b64, ciphertext).unwrap(), result.private_key);
}

#[test]
fn test_zero_concurrency_rejected_before_start() {
    let config = Config::try_parse_from(["vanity_wallet", "--concurrency", "0"]).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidConcurrency(0))
    ));

    assert!(matches!(
        WorkerPool::start(config.search_config()),
        Err(PoolError::Config(ConfigError::InvalidConcurrency(0)))
    ));
}

#[test]
fn test_attempt_counter_is_monotonic() {
    let config = SearchConfig {
        concurrency: 2,
        ..SearchConfig::new(format!("0x{}", "f".repeat(40)), "")
    };
    let mut pool = WorkerPool::start(config).unwrap();

    let mut last = 0;
    for _ in 0..20 {
        let now = pool.total_attempts();
        assert!(now >= last);
        last = now;
        thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(pool.join(), 2);
    let after_join = pool.total_attempts();
    assert!(after_join >= last);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(pool.total_attempts(), after_join);
}

/// Accepts one HTTP request and returns its raw head and body.
fn serve_once(
    listener: TcpListener,
    status_line: &'static str,
) -> mpsc::Receiver<(String, String)> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let head_end = loop {
            let n = stream.read(&mut chunk).unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
        let content_length: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);

        while buf.len() < head_end + content_length {
            let n = stream.read(&mut chunk).unwrap();
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }

        let body = String::from_utf8_lossy(&buf[head_end..head_end + content_length]).into_owned();
        let response = format!("{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status_line);
        stream.write_all(response.as_bytes()).unwrap();
        let _ = tx.send((head, body));
    });
    rx
}

#[test]
fn test_webhook_delivery() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/webhook", listener.local_addr().unwrap());
    let received = serve_once(listener, "HTTP/1.1 204 No Content");

    let message = Message::found("0xAA12", "0xdeadbeef");
    WebhookNotifier::new(url).unwrap().notify(&message).unwrap();

    let (head, body) = received.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(head.starts_with("post /webhook"));
    assert!(head.contains("content-type: application/json; charset=utf-8"));

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["content"], "Wallet Address: 0xAA12\nPrivate Key: 0xdeadbeef");
}

#[test]
fn test_webhook_error_status() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/webhook", listener.local_addr().unwrap());
    let _received = serve_once(listener, "HTTP/1.1 500 Internal Server Error");

    let notifier = WebhookNotifier::new(url).unwrap();
    let err = notifier.notify(&Message::found("0x00", "0x01")).unwrap_err();
    assert!(matches!(err, notify::NotifyError::Status(s) if s.as_u16() == 500));
}

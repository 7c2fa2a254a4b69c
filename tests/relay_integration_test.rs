use anyhow::Result;
use card_relay::{RelayConfig, RelayEngine, RunOutcome, Transport};
use card_relay::domain::model::StatusToken;
use httpmock::prelude::*;
use std::ffi::CString;
use std::io::{ErrorKind, Read};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tempfile::TempDir;

/// Holds a non-blocking read end of a FIFO open for the whole test and
/// collects everything written into it.
struct FifoCollector {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<String>,
}

impl FifoCollector {
    fn start(path: &Path) -> Self {
        let c_path = CString::new(path.as_os_str().as_bytes()).unwrap();
        let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
        assert_eq!(rc, 0, "mkfifo failed: {}", std::io::Error::last_os_error());

        let mut pipe = std::fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            let mut received = Vec::new();
            let mut buf = [0u8; 256];
            loop {
                match pipe.read(&mut buf) {
                    Ok(0) => {
                        if stop_flag.load(Ordering::SeqCst) {
                            break;
                        }
                        std::thread::sleep(Duration::from_millis(5));
                    }
                    Ok(n) => received.extend_from_slice(&buf[..n]),
                    Err(e) if e.kind() == ErrorKind::WouldBlock => {
                        std::thread::sleep(Duration::from_millis(5));
                    }
                    Err(e) => panic!("fifo read failed: {}", e),
                }
            }
            String::from_utf8(received).unwrap()
        });

        Self { stop, handle }
    }

    fn finish(self) -> Vec<String> {
        self.stop.store(true, Ordering::SeqCst);
        let text = self.handle.join().unwrap();
        text.lines().map(str::to_string).collect()
    }
}

struct Fixture {
    _dir: TempDir,
    capture_path: PathBuf,
    fifo_path: PathBuf,
    log_path: PathBuf,
}

impl Fixture {
    fn new(capture: &str) -> Self {
        Self::from_bytes(format!("{}\n", capture).as_bytes())
    }

    fn from_bytes(content: &[u8]) -> Self {
        let dir = TempDir::new().unwrap();
        let capture_path = dir.path().join("card_data_hex.txt");
        std::fs::write(&capture_path, content).unwrap();
        Self {
            capture_path,
            fifo_path: dir.path().join("bus_payment_control"),
            log_path: dir.path().join("api_log.txt"),
            _dir: dir,
        }
    }

    fn config(&self, endpoint: String) -> RelayConfig {
        RelayConfig {
            capture_path: self.capture_path.to_string_lossy().into_owned(),
            fifo_path: self.fifo_path.to_string_lossy().into_owned(),
            api_endpoint: endpoint,
            log_path: self.log_path.to_string_lossy().into_owned(),
            audit_log_enabled: true,
            retry_budget_ms: 1000,
            retry_interval_ms: 20,
            request_timeout_secs: 5,
            transport: Transport::Reqwest,
        }
    }

    fn log(&self) -> String {
        std::fs::read_to_string(&self.log_path).unwrap_or_default()
    }
}

fn track_capture(track: &str) -> String {
    hex::encode_upper(track.as_bytes())
}

#[tokio::test]
async fn test_track_capture_end_to_end() -> Result<()> {
    let fixture = Fixture::new(&track_capture(";4111111111111111=2612101?"));
    let collector = FifoCollector::start(&fixture.fifo_path);

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/payment/card/")
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "pan": "4111111111111111",
                "expiryDate": "12/26",
                "expiry_date": "12/26"
            }));
        then.status(200).body("OK");
    });

    let engine = RelayEngine::from_config(&fixture.config(server.url("/api/v1/payment/card/")))?;
    let report = engine.run().await;

    api_mock.assert();
    assert_eq!(report.outcome, RunOutcome::Relayed);
    assert_eq!(report.status, Some(StatusToken::Success));
    assert!(report.field_delivery.unwrap().is_delivered());

    let relay = report.relay.unwrap();
    let result = relay.result.unwrap();
    assert_eq!(result.http_status.as_deref(), Some("200"));
    assert_eq!(result.body, "OK");

    assert_eq!(
        collector.finish(),
        vec!["PAN:4111111111111111;EXP:2612", "0"]
    );

    let log = fixture.log();
    assert!(log.contains("[SUCCESS] "));
    assert!(log.contains("Expiry for API (MM/YY): 12/26"));
    Ok(())
}

#[tokio::test]
async fn test_reader_garbage_after_hex_is_ignored() -> Result<()> {
    let mut content = track_capture(";4111111111111111=2612101?").into_bytes();
    content.extend_from_slice(&[0xFF, 0xFE, b'\n']);
    let fixture = Fixture::from_bytes(&content);
    let collector = FifoCollector::start(&fixture.fifo_path);

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/card").json_body(serde_json::json!({
            "pan": "4111111111111111",
            "expiryDate": "12/26",
            "expiry_date": "12/26"
        }));
        then.status(201);
    });

    let engine = RelayEngine::from_config(&fixture.config(server.url("/card")))?;
    let report = engine.run().await;

    api_mock.assert();
    assert_eq!(report.outcome, RunOutcome::Relayed);
    assert_eq!(
        collector.finish(),
        vec!["PAN:4111111111111111;EXP:2612", "0"]
    );
    Ok(())
}

#[tokio::test]
async fn test_tlv_capture_with_declined_payment() -> Result<()> {
    let fixture = Fixture::new("C1DFEE0A5A0847617390010100105F24032512DF");
    let collector = FifoCollector::start(&fixture.fifo_path);

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/card");
        then.status(402).body("{\"error\":\"declined\"}");
    });

    let engine = RelayEngine::from_config(&fixture.config(server.url("/card")))?;
    let report = engine.run().await;

    api_mock.assert();
    assert_eq!(report.status, Some(StatusToken::Failure));
    assert_eq!(
        collector.finish(),
        vec!["PAN:4761739001010010;EXP:2512", "1"]
    );
    assert!(fixture.log().contains("API call failed with HTTP 402"));
    Ok(())
}

#[tokio::test]
async fn test_missing_pan_never_calls_api() -> Result<()> {
    let fixture = Fixture::new("C1DFEE5F24032512");
    let collector = FifoCollector::start(&fixture.fifo_path);

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST);
        then.status(200);
    });

    let engine = RelayEngine::from_config(&fixture.config(server.url("/card")))?;
    let report = engine.run().await;

    api_mock.assert_hits(0);
    assert_eq!(report.outcome, RunOutcome::PanMissing);
    assert_eq!(collector.finish(), vec!["1"]);
    assert!(fixture.log().contains("tag 5A08 not found"));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_api_reports_failure() -> Result<()> {
    let fixture = Fixture::new(&track_capture(";4111111111111111=2612101?"));
    let collector = FifoCollector::start(&fixture.fifo_path);

    let engine = RelayEngine::from_config(&fixture.config("http://127.0.0.1:9/card".to_string()))?;
    let report = engine.run().await;

    assert_eq!(report.outcome, RunOutcome::Relayed);
    assert!(report.relay.unwrap().result.is_none());
    assert_eq!(
        collector.finish(),
        vec!["PAN:4111111111111111;EXP:2612", "1"]
    );
    Ok(())
}

#[tokio::test]
async fn test_empty_capture_writes_nothing() -> Result<()> {
    let fixture = Fixture::new("");
    let collector = FifoCollector::start(&fixture.fifo_path);

    let engine = RelayEngine::from_config(&fixture.config("http://127.0.0.1:9/card".to_string()))?;
    let report = engine.run().await;

    assert_eq!(report.outcome, RunOutcome::NoCapture);
    assert!(collector.finish().is_empty());
    assert!(fixture.log().contains("[ERROR] "));
    Ok(())
}

#[tokio::test]
async fn test_absent_consumer_still_relays() -> Result<()> {
    let fixture = Fixture::new(&track_capture(";4111111111111111=2612101?"));

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/card");
        then.status(201);
    });

    let mut config = fixture.config(server.url("/card"));
    config.retry_budget_ms = 200;
    let engine = RelayEngine::from_config(&config)?;
    let report = engine.run().await;

    // No pipe was ever created: both writes time out, the API is still called.
    api_mock.assert();
    assert!(!report.field_delivery.unwrap().is_delivered());
    assert_eq!(report.status, Some(StatusToken::Success));
    Ok(())
}

use crate::domain::model::{DeliveryOutcome, Payload};
use crate::domain::ports::DeliveryChannel;
use crate::utils::logger::AuditLog;
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const DEFAULT_RETRY_BUDGET: Duration = Duration::from_millis(3000);
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
enum Attempt {
    Written,
    Partial { written: usize, expected: usize },
    Failed(std::io::Error),
}

/// Writes payloads into a named pipe whose reader may not be attached yet.
///
/// Each attempt opens the pipe with `O_NONBLOCK` (so a missing reader fails
/// fast with `ENXIO` instead of hanging), issues exactly one `write` of the
/// whole payload and closes the handle again. Attempts repeat on a flat
/// interval until the budget is spent.
#[derive(Debug, Clone)]
pub struct FifoChannel {
    path: PathBuf,
    budget: Duration,
    interval: Duration,
    audit: AuditLog,
}

impl FifoChannel {
    pub fn new(path: impl Into<PathBuf>, audit: AuditLog) -> Self {
        Self {
            path: path.into(),
            budget: DEFAULT_RETRY_BUDGET,
            interval: DEFAULT_RETRY_INTERVAL,
            audit,
        }
    }

    pub fn with_retry(mut self, budget: Duration, interval: Duration) -> Self {
        self.budget = budget;
        self.interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn attempt(&self, bytes: &[u8]) -> Attempt {
        let mut pipe = match OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.path)
        {
            Ok(pipe) => pipe,
            Err(e) => return Attempt::Failed(e),
        };

        match pipe.write(bytes) {
            Ok(n) if n == bytes.len() => Attempt::Written,
            Ok(n) => Attempt::Partial {
                written: n,
                expected: bytes.len(),
            },
            Err(e) => Attempt::Failed(e),
        }
    }
}

#[async_trait]
impl DeliveryChannel for FifoChannel {
    async fn send(&self, payload: &Payload) -> DeliveryOutcome {
        let wire = payload.to_wire();
        let started = Instant::now();
        let mut attempts = 0u32;

        while started.elapsed() < self.budget {
            attempts += 1;
            match self.attempt(wire.as_bytes()) {
                Attempt::Written => {
                    self.audit.success(format!(
                        "Wrote {:?} to {} (attempt {})",
                        payload.to_string(),
                        self.path.display(),
                        attempts
                    ));
                    return DeliveryOutcome::Delivered { attempts };
                }
                Attempt::Partial { written, expected } => {
                    self.audit.error(format!(
                        "Partial write to {}: {} of {} bytes",
                        self.path.display(),
                        written,
                        expected
                    ));
                }
                Attempt::Failed(e) => {
                    tracing::debug!(attempt = attempts, error = %e, "pipe not writable yet");
                }
            }
            tokio::time::sleep(self.interval).await;
        }

        self.audit.error(format!(
            "Could not open or write {} within {:?} ({} attempts)",
            self.path.display(),
            self.budget,
            attempts
        ));
        DeliveryOutcome::TimedOut { attempts }
    }
}

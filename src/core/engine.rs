use crate::adapters::{FifoChannel, FileCaptureSource, HttpTransport};
use crate::core::pipeline::{CardPipeline, RunReport};
use crate::core::relay::ApiRelay;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::logger::AuditLog;

pub type DefaultPipeline = CardPipeline<FileCaptureSource, FifoChannel, HttpTransport>;

pub struct RelayEngine {
    pipeline: DefaultPipeline,
}

impl RelayEngine {
    pub fn new(pipeline: DefaultPipeline) -> Self {
        Self { pipeline }
    }

    /// Wires the file capture source, the pipe channel and the configured
    /// HTTP transport.
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let audit = match config.log_path() {
            Some(path) => AuditLog::new(path),
            None => AuditLog::disabled(),
        };

        let source = FileCaptureSource::new(config.capture_path());
        let channel = FifoChannel::new(config.fifo_path(), audit.clone())
            .with_retry(config.retry_budget(), config.retry_interval());
        let transport = HttpTransport::build(config.transport(), config.request_timeout())?;
        let relay = ApiRelay::new(transport, config.api_endpoint(), audit.clone());

        tracing::debug!(
            "Engine wired: capture={}, pipe={}, endpoint={}, transport={}",
            config.capture_path(),
            config.fifo_path(),
            config.api_endpoint(),
            config.transport()
        );

        Ok(Self::new(CardPipeline::new(source, channel, relay, audit)))
    }

    pub fn pipeline(&self) -> &DefaultPipeline {
        &self.pipeline
    }

    /// Business failures end up in the report and on the pipe, never as `Err`.
    pub async fn run(&self) -> RunReport {
        tracing::info!("Starting card relay run");
        let report = self.pipeline.run().await;
        tracing::info!("Card relay run finished: {:?}", report.outcome);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RelayConfig, Transport};
    use crate::core::pipeline::RunOutcome;
    use std::path::Path;

    #[test]
    fn test_from_config_wires_pipe_path() {
        let config = RelayConfig {
            fifo_path: "/tmp/relay_engine_test_pipe".to_string(),
            transport: Transport::Curl,
            audit_log_enabled: false,
            ..RelayConfig::default()
        };
        let engine = RelayEngine::from_config(&config).unwrap();
        assert_eq!(
            engine.pipeline().channel().path(),
            Path::new("/tmp/relay_engine_test_pipe")
        );
    }

    #[tokio::test]
    async fn test_missing_capture_file_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let config = RelayConfig {
            capture_path: dir.path().join("absent.txt").to_string_lossy().into_owned(),
            fifo_path: dir.path().join("pipe").to_string_lossy().into_owned(),
            audit_log_enabled: false,
            ..RelayConfig::default()
        };
        let engine = RelayEngine::from_config(&config).unwrap();
        let report = engine.run().await;

        assert_eq!(report.outcome, RunOutcome::NoCapture);
        assert!(report.status.is_none());
        assert!(!dir.path().join("pipe").exists());
    }
}

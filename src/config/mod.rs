pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::{RelayError, Result};
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use toml_config::TomlConfig;

pub const DEFAULT_CAPTURE_PATH: &str = "/tmp/card_data_hex.txt";
pub const DEFAULT_FIFO_PATH: &str = "/tmp/bus_payment_control";
pub const DEFAULT_API_ENDPOINT: &str = "https://api.yeri.az/api/v1/payment/card/";
pub const DEFAULT_LOG_PATH: &str = "/tmp/api_log.txt";

/// HTTP client used to reach the payment API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Reqwest,
    Curl,
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reqwest" => Ok(Transport::Reqwest),
            "curl" => Ok(Transport::Curl),
            other => Err(format!(
                "unknown transport '{}', expected 'reqwest' or 'curl'",
                other
            )),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Reqwest => f.write_str("reqwest"),
            Transport::Curl => f.write_str("curl"),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub capture_path: String,
    pub fifo_path: String,
    pub api_endpoint: String,
    pub log_path: String,
    pub audit_log_enabled: bool,
    pub retry_budget_ms: u64,
    pub retry_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub transport: Transport,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            capture_path: DEFAULT_CAPTURE_PATH.to_string(),
            fifo_path: DEFAULT_FIFO_PATH.to_string(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            log_path: DEFAULT_LOG_PATH.to_string(),
            audit_log_enabled: true,
            retry_budget_ms: 3000,
            retry_interval_ms: 100,
            request_timeout_secs: 30,
            transport: Transport::Reqwest,
        }
    }
}

impl ConfigProvider for RelayConfig {
    fn capture_path(&self) -> &str {
        &self.capture_path
    }

    fn fifo_path(&self) -> &str {
        &self.fifo_path
    }

    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn log_path(&self) -> Option<&str> {
        self.audit_log_enabled.then_some(self.log_path.as_str())
    }

    fn retry_budget(&self) -> Duration {
        Duration::from_millis(self.retry_budget_ms)
    }

    fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn transport(&self) -> Transport {
        self.transport
    }
}

impl Validate for RelayConfig {
    fn validate(&self) -> Result<()> {
        validate_path("capture.path", &self.capture_path)?;
        validate_path("channel.fifo_path", &self.fifo_path)?;
        validate_url("api.endpoint", &self.api_endpoint)?;
        if self.audit_log_enabled {
            validate_path("log.path", &self.log_path)?;
        }

        validate_positive_number("channel.retry_interval_ms", self.retry_interval_ms, 1)?;
        if self.retry_interval_ms > self.retry_budget_ms {
            return Err(RelayError::InvalidConfigValueError {
                field: "channel.retry_interval_ms".to_string(),
                value: self.retry_interval_ms.to_string(),
                reason: format!(
                    "Interval cannot exceed the retry budget of {}ms",
                    self.retry_budget_ms
                ),
            });
        }
        validate_range("api.timeout_seconds", self.request_timeout_secs, 1, 300)?;

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, clap::Parser)]
#[command(name = "card-relay")]
#[command(about = "Extract PAN and expiry from a card reader capture and relay them")]
pub struct CliConfig {
    /// TOML configuration file; explicit flags override its values
    #[arg(short, long)]
    pub config: Option<String>,

    /// File holding the hex capture written by the reader
    #[arg(long)]
    pub capture_path: Option<String>,

    /// Named pipe read by the consumer process
    #[arg(long)]
    pub fifo_path: Option<String>,

    /// Payment API endpoint
    #[arg(long)]
    pub api_endpoint: Option<String>,

    /// Append-only log file
    #[arg(long)]
    pub log_path: Option<String>,

    /// Do not write the append-only log file
    #[arg(long)]
    pub no_audit_log: bool,

    /// Total time allowed for each pipe write, in milliseconds
    #[arg(long)]
    pub retry_budget_ms: Option<u64>,

    /// Pause between pipe write attempts, in milliseconds
    #[arg(long)]
    pub retry_interval_ms: Option<u64>,

    /// Payment API request timeout, in seconds
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// HTTP client: reqwest or curl
    #[arg(long)]
    pub transport: Option<Transport>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Defaults, then the TOML file, then explicit flags.
    pub fn resolve(&self) -> Result<RelayConfig> {
        let mut config = RelayConfig::default();

        if let Some(path) = &self.config {
            tracing::info!("Loading configuration from {}", path);
            TomlConfig::from_file(path)?.apply_to(&mut config);
        }

        if let Some(path) = &self.capture_path {
            config.capture_path = path.clone();
        }
        if let Some(path) = &self.fifo_path {
            config.fifo_path = path.clone();
        }
        if let Some(endpoint) = &self.api_endpoint {
            config.api_endpoint = endpoint.clone();
        }
        if let Some(path) = &self.log_path {
            config.log_path = path.clone();
        }
        if self.no_audit_log {
            config.audit_log_enabled = false;
        }
        if let Some(budget) = self.retry_budget_ms {
            config.retry_budget_ms = budget;
        }
        if let Some(interval) = self.retry_interval_ms {
            config.retry_interval_ms = interval;
        }
        if let Some(timeout) = self.request_timeout_secs {
            config.request_timeout_secs = timeout;
        }
        if let Some(transport) = self.transport {
            config.transport = transport;
        }

        Ok(config)
    }
}

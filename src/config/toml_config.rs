use crate::config::{RelayConfig, Transport};
use crate::utils::error::{RelayError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub capture: Option<CaptureSection>,
    pub channel: Option<ChannelSection>,
    pub api: Option<ApiSection>,
    pub log: Option<LogSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelSection {
    pub fifo_path: Option<String>,
    pub retry_budget_ms: Option<u64>,
    pub retry_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSection {
    pub endpoint: Option<String>,
    pub transport: Option<Transport>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSection {
    pub path: Option<String>,
    pub enabled: Option<bool>,
}

impl TomlConfig {
    /// Loads the file, substituting `${VAR}` references first.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RelayError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RelayError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RelayError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Overlays every value present in the file onto `config`.
    pub fn apply_to(&self, config: &mut RelayConfig) {
        if let Some(path) = self.capture.as_ref().and_then(|c| c.path.clone()) {
            config.capture_path = path;
        }

        if let Some(channel) = &self.channel {
            if let Some(path) = &channel.fifo_path {
                config.fifo_path = path.clone();
            }
            if let Some(budget) = channel.retry_budget_ms {
                config.retry_budget_ms = budget;
            }
            if let Some(interval) = channel.retry_interval_ms {
                config.retry_interval_ms = interval;
            }
        }

        if let Some(api) = &self.api {
            if let Some(endpoint) = &api.endpoint {
                config.api_endpoint = endpoint.clone();
            }
            if let Some(transport) = api.transport {
                config.transport = transport;
            }
            if let Some(timeout) = api.timeout_seconds {
                config.request_timeout_secs = timeout;
            }
        }

        if let Some(log) = &self.log {
            if let Some(path) = &log.path {
                config.log_path = path.clone();
            }
            if let Some(enabled) = log.enabled {
                config.audit_log_enabled = enabled;
            }
        }
    }
}

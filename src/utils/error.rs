use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Capture data is empty: {path}")]
    EmptyCapture { path: String },

    #[error("HTTP client could not be invoked: {message}")]
    ClientInvocationError { message: String },
}

impl RelayError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RelayError::ConfigError { .. }
                | RelayError::InvalidConfigValueError { .. }
                | RelayError::MissingConfigError { .. }
                | RelayError::ConfigValidationError { .. }
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RelayError::ApiError(_) => "The payment API could not be reached".to_string(),
            RelayError::IoError(e) => format!("A file operation failed: {}", e),
            RelayError::SerializationError(_) => "The request could not be encoded".to_string(),
            RelayError::EmptyCapture { path } => format!("No card data found in {}", path),
            RelayError::ClientInvocationError { message } => {
                format!("The HTTP client could not be started: {}", message)
            }
            other => format!("Invalid configuration: {}", other),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RelayError::ApiError(_) => "Check network access and the configured API endpoint",
            RelayError::IoError(_) => "Check that the capture, pipe and log paths exist and are accessible",
            RelayError::SerializationError(_) => "Check the extracted card fields for invalid characters",
            RelayError::EmptyCapture { .. } => "Swipe or tap the card again so the reader rewrites the capture file",
            RelayError::ClientInvocationError { .. } => "Install curl or switch to the built-in transport with --transport reqwest",
            _ => "Review the command line flags and the TOML configuration file",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{FifoChannel, FileCaptureSource, HttpTransport};
pub use config::{RelayConfig, Transport};
pub use core::{
    engine::RelayEngine,
    pipeline::{CardPipeline, RunOutcome, RunReport},
    relay::ApiRelay,
};
pub use utils::error::{RelayError, Result};

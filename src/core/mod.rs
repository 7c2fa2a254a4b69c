pub mod detector;
pub mod engine;
pub mod extract;
pub mod pipeline;
pub mod relay;
pub mod scanner;
pub mod track;

pub use crate::domain::model::{CardFields, Payload, RawCapture, StatusToken};
pub use crate::domain::ports::{ApiClient, CaptureSource, ConfigProvider, DeliveryChannel};
pub use crate::utils::error::Result;

use crate::domain::model::{ApiReply, DeliveryOutcome, Payload, RawCapture};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait CaptureSource: Send + Sync {
    async fn read_capture(&self) -> Result<RawCapture>;
    fn describe(&self) -> String;
}

#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send(&self, payload: &Payload) -> DeliveryOutcome;
}

#[async_trait]
pub trait ApiClient: Send + Sync {
    /// POSTs `body` as JSON. `Err` means the request never produced a reply.
    async fn post_json(&self, url: &str, body: &str) -> Result<ApiReply>;
}

pub trait ConfigProvider: Send + Sync {
    fn capture_path(&self) -> &str;
    fn fifo_path(&self) -> &str;
    fn api_endpoint(&self) -> &str;
    fn log_path(&self) -> Option<&str>;
    fn retry_budget(&self) -> Duration;
    fn retry_interval(&self) -> Duration;
    fn request_timeout(&self) -> Duration;
    fn transport(&self) -> crate::config::Transport;
}

// Adapters layer: concrete implementations of the domain ports for the capture
// file, the consumer pipe and the payment API.

pub mod fifo;
pub mod http;
pub mod storage;

pub use fifo::FifoChannel;
pub use http::{CurlApiClient, HttpTransport, ReqwestApiClient};
pub use storage::FileCaptureSource;

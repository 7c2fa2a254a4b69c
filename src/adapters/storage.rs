use crate::domain::model::RawCapture;
use crate::domain::ports::CaptureSource;
use crate::utils::error::{RelayError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Reads the first line of the reader's capture file.
///
/// The file is read as raw bytes. Bytes that are not valid UTF-8 become
/// replacement characters, which the track decoder later skips as bad pairs.
#[derive(Debug, Clone)]
pub struct FileCaptureSource {
    path: PathBuf,
}

impl FileCaptureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CaptureSource for FileCaptureSource {
    async fn read_capture(&self) -> Result<RawCapture> {
        let content = tokio::fs::read(&self.path).await?;
        let first_line = content.split(|&b| b == b'\n').next().unwrap_or_default();
        let first_line = first_line.strip_suffix(b"\r").unwrap_or(first_line);

        if first_line.is_empty() {
            return Err(RelayError::EmptyCapture {
                path: self.path.display().to_string(),
            });
        }

        Ok(RawCapture::new(String::from_utf8_lossy(first_line)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Prefix that marks a TLV-tagged capture.
pub const TLV_SENTINEL: &str = "C1DFEE";

/// The single line read from the reader's capture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCapture(String);

impl RawCapture {
    pub fn new(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// First `max_chars` characters, with `...` appended when truncated.
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.0, max_chars)
    }
}

pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureFormat {
    Tlv,
    Track,
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureFormat::Tlv => write!(f, "TLV ({})", TLV_SENTINEL),
            CaptureFormat::Track => write!(f, "track"),
        }
    }
}

/// Bytes recovered from a hex-encoded track capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedTrack(Vec<u8>);

impl DecodedTrack {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_lossy_string(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

/// PAN and optional YYMM expiry pulled out of a capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFields {
    pub pan: String,
    pub expiry: Option<String>,
}

impl CardFields {
    pub fn new(pan: impl Into<String>, expiry: Option<String>) -> Self {
        Self {
            pan: pan.into(),
            expiry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusToken {
    Success,
    Failure,
}

impl StatusToken {
    pub fn from_success(success: bool) -> Self {
        if success {
            StatusToken::Success
        } else {
            StatusToken::Failure
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            StatusToken::Success => "0",
            StatusToken::Failure => "1",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StatusToken::Success)
    }
}

/// A line written to the consumer pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Fields { pan: String, expiry: Option<String> },
    Status(StatusToken),
}

impl Payload {
    pub fn fields(fields: &CardFields) -> Self {
        Payload::Fields {
            pan: fields.pan.clone(),
            expiry: fields.expiry.clone(),
        }
    }

    pub fn pan_only(pan: &str) -> Self {
        Payload::Fields {
            pan: pan.to_string(),
            expiry: None,
        }
    }

    pub fn status(token: StatusToken) -> Self {
        Payload::Status(token)
    }

    /// Newline-terminated wire form.
    pub fn to_wire(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Fields { pan, expiry } => {
                write!(f, "PAN:{}", pan)?;
                match expiry {
                    Some(expiry) if !expiry.is_empty() => write!(f, ";EXP:{}", expiry),
                    _ => Ok(()),
                }
            }
            Payload::Status(token) => f.write_str(token.as_wire()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    TimedOut { attempts: u32 },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts } | DeliveryOutcome::TimedOut { attempts } => {
                *attempts
            }
        }
    }
}

/// What a transport got back: a three character status code (if any) and the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub http_status: Option<String>,
    pub body: String,
}

impl ApiReply {
    pub fn new(http_status: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            http_status: Some(http_status.into()),
            body: body.into(),
        }
    }

    /// Splits `<body><status>` output where the status is the trailing three
    /// characters. Anything shorter carries no status.
    pub fn from_raw(raw: &str) -> Self {
        match raw.char_indices().rev().nth(2) {
            Some((split, _)) => Self {
                http_status: Some(raw[split..].to_string()),
                body: raw[..split].to_string(),
            },
            None => Self {
                http_status: None,
                body: raw.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.http_status.as_deref(), Some("200") | Some("201"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResult {
    pub http_status: Option<String>,
    pub body: String,
    pub elapsed: Duration,
}

impl ApiResult {
    pub fn new(reply: ApiReply, elapsed: Duration) -> Self {
        Self {
            http_status: reply.http_status,
            body: reply.body,
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.http_status.as_deref(), Some("200") | Some("201"))
    }
}

/// JSON body for the payment endpoint. The expiry is sent under both key
/// spellings the backend has used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub pan: String,
    #[serde(rename = "expiryDate")]
    pub expiry_date: String,
    #[serde(rename = "expiry_date")]
    pub expiry_date_snake: String,
}

impl PaymentRequest {
    pub fn new(pan: &str, formatted_expiry: &str) -> Self {
        Self {
            pan: pan.to_string(),
            expiry_date: formatted_expiry.to_string(),
            expiry_date_snake: formatted_expiry.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

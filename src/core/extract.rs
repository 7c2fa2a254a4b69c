use crate::core::scanner::{self, ScanMiss};
use crate::domain::model::CardFields;
use thiserror::Error;

pub const PAN_TAG: &str = "5A08";
pub const PAN_HEX_LEN: usize = 16;
pub const EXPIRY_TAG: &str = "5F2403";
pub const EXPIRY_LEN: usize = 4;

const TRACK_START: u8 = b';';
const TRACK_END: u8 = b'?';
const TRACK_SEPARATOR: u8 = b'=';

/// Why a field could not be extracted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldMiss {
    #[error("track start sentinel ';' not found")]
    MissingStartSentinel,

    #[error("track end sentinel '?' not found")]
    MissingEndSentinel,

    #[error("track separator '=' not found")]
    MissingSeparator,

    #[error("expiry after '=' is truncated: {available} of 4 characters")]
    ExpiryTruncated { available: usize },

    #[error("tag {tag} not found")]
    TagNotFound { tag: &'static str },

    #[error("{tag} value truncated: {available} of {required} characters")]
    TagTruncated {
        tag: &'static str,
        available: usize,
        required: usize,
    },
}

impl FieldMiss {
    fn from_tag_scan(tag: &'static str, miss: ScanMiss) -> Self {
        match miss {
            ScanMiss::Truncated {
                available,
                required,
            } => FieldMiss::TagTruncated {
                tag,
                available,
                required,
            },
            ScanMiss::TagNotFound | ScanMiss::Unterminated => FieldMiss::TagNotFound { tag },
        }
    }
}

/// Per-field result of running one extraction strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub pan: Result<String, FieldMiss>,
    pub expiry: Result<String, FieldMiss>,
    /// Offsets of the PAN and expiry tags on the TLV path.
    pub tag_offsets: Option<(Option<usize>, Option<usize>)>,
}

impl Extraction {
    /// `None` when the PAN is missing or empty.
    pub fn into_fields(self) -> Option<CardFields> {
        let pan = self.pan.ok().filter(|pan| !pan.is_empty())?;
        Some(CardFields::new(pan, self.expiry.ok()))
    }
}

/// ISO 7813 style `;<PAN>=<YYMM>...?` framing over decoded track bytes.
pub fn extract_track(track: &[u8]) -> Extraction {
    let body = match scanner::delimited(track, TRACK_START, TRACK_END) {
        Ok(m) => m.value,
        Err(ScanMiss::TagNotFound) => return Extraction::both_missing(FieldMiss::MissingStartSentinel),
        Err(_) => return Extraction::both_missing(FieldMiss::MissingEndSentinel),
    };

    let Some(eq) = body.iter().position(|&b| b == TRACK_SEPARATOR) else {
        return Extraction::both_missing(FieldMiss::MissingSeparator);
    };

    let pan = String::from_utf8_lossy(&body[..eq]).into_owned();
    let after = &body[eq + 1..];
    let expiry = if after.len() >= EXPIRY_LEN {
        Ok(String::from_utf8_lossy(&after[..EXPIRY_LEN]).into_owned())
    } else {
        Err(FieldMiss::ExpiryTruncated {
            available: after.len(),
        })
    };

    Extraction {
        pan: Ok(pan),
        expiry,
        tag_offsets: None,
    }
}

/// `5A08` + 16 hex characters of PAN and `5F2403` + 4 characters of YYMM,
/// each found by an independent first-occurrence search over the whole capture.
pub fn extract_tlv(hex_data: &str) -> Extraction {
    let bytes = hex_data.as_bytes();

    let pan = scanner::fixed_width(bytes, PAN_TAG.as_bytes(), PAN_HEX_LEN);
    let expiry = scanner::fixed_width(bytes, EXPIRY_TAG.as_bytes(), EXPIRY_LEN);

    let tag_offsets = Some((
        scanner::find(bytes, PAN_TAG.as_bytes(), 0),
        scanner::find(bytes, EXPIRY_TAG.as_bytes(), 0),
    ));

    Extraction {
        pan: pan
            .map(|m| m.value_lossy())
            .map_err(|miss| FieldMiss::from_tag_scan(PAN_TAG, miss)),
        expiry: expiry
            .map(|m| m.value_lossy())
            .map_err(|miss| FieldMiss::from_tag_scan(EXPIRY_TAG, miss)),
        tag_offsets,
    }
}

impl Extraction {
    fn both_missing(miss: FieldMiss) -> Self {
        Self {
            pan: Err(miss.clone()),
            expiry: Err(miss),
            tag_offsets: None,
        }
    }
}

/// `YYMM` to `MM/YY`. Length is counted in bytes and only exactly four are
/// accepted; the swap is done on bytes too.
pub fn reformat_expiry(yymm: &str) -> Option<String> {
    let bytes = yymm.as_bytes();
    if bytes.len() != EXPIRY_LEN {
        return None;
    }
    Some(format!(
        "{}/{}",
        String::from_utf8_lossy(&bytes[2..]),
        String::from_utf8_lossy(&bytes[..2])
    ))
}

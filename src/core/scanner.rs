//! First-occurrence tag and sentinel search over byte strings.
//!
//! Both extractors locate their fields through the two shapes here: a fixed
//! tag followed by a fixed-width value, or a value framed by an opening and a
//! closing sentinel. Each lookup is stateless and stops at the first match.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMatch<'a> {
    pub tag: &'a [u8],
    /// Offset of the tag (or opening sentinel) in the haystack.
    pub offset: usize,
    pub value: &'a [u8],
}

impl TokenMatch<'_> {
    pub fn value_lossy(&self) -> String {
        String::from_utf8_lossy(self.value).into_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMiss {
    TagNotFound,
    Unterminated,
    Truncated { available: usize, required: usize },
}

impl fmt::Display for ScanMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMiss::TagNotFound => write!(f, "not found"),
            ScanMiss::Unterminated => write!(f, "closing sentinel not found"),
            ScanMiss::Truncated {
                available,
                required,
            } => write!(f, "truncated: {} of {} characters", available, required),
        }
    }
}

pub fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// `tag` followed by exactly `width` value bytes.
pub fn fixed_width<'a>(
    haystack: &'a [u8],
    tag: &'a [u8],
    width: usize,
) -> Result<TokenMatch<'a>, ScanMiss> {
    let offset = find(haystack, tag, 0).ok_or(ScanMiss::TagNotFound)?;
    let start = offset + tag.len();
    let available = haystack.len() - start;
    if available < width {
        return Err(ScanMiss::Truncated {
            available,
            required: width,
        });
    }

    Ok(TokenMatch {
        tag,
        offset,
        value: &haystack[start..start + width],
    })
}

/// Bytes strictly between the first `open` and the first `close` after it.
pub fn delimited(haystack: &[u8], open: u8, close: u8) -> Result<TokenMatch<'_>, ScanMiss> {
    let offset = haystack
        .iter()
        .position(|&b| b == open)
        .ok_or(ScanMiss::TagNotFound)?;
    let body_start = offset + 1;
    let end = haystack[body_start..]
        .iter()
        .position(|&b| b == close)
        .ok_or(ScanMiss::Unterminated)?
        + body_start;

    Ok(TokenMatch {
        tag: &haystack[offset..body_start],
        offset,
        value: &haystack[body_start..end],
    })
}

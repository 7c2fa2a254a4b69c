use crate::domain::model::{CaptureFormat, RawCapture, TLV_SENTINEL};

/// Classifies a capture by its leading sentinel. Every input is classifiable.
pub fn detect(capture: &RawCapture) -> CaptureFormat {
    if capture.as_str().starts_with(TLV_SENTINEL) {
        CaptureFormat::Tlv
    } else {
        CaptureFormat::Track
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_prefix_is_tlv() {
        assert_eq!(detect(&RawCapture::new("C1DFEE")), CaptureFormat::Tlv);
        assert_eq!(
            detect(&RawCapture::new("C1DFEE5A084111111111111111")),
            CaptureFormat::Tlv
        );
    }

    #[test]
    fn test_everything_else_is_track() {
        assert_eq!(detect(&RawCapture::new("")), CaptureFormat::Track);
        assert_eq!(detect(&RawCapture::new("C1DFE")), CaptureFormat::Track);
        assert_eq!(detect(&RawCapture::new("c1dfee5A08")), CaptureFormat::Track);
        assert_eq!(detect(&RawCapture::new("00C1DFEE")), CaptureFormat::Track);
        assert_eq!(
            detect(&RawCapture::new("3B343131313131313131313131313131313D")),
            CaptureFormat::Track
        );
    }
}

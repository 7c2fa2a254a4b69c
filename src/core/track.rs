use crate::domain::model::DecodedTrack;

/// Decodes hex digit pairs into bytes, dropping any pair that is not valid hex
/// along with an unpaired trailing character. Reader hardware sometimes emits
/// garbage at the tail, which must not cost us the PAN in front of it.
pub fn decode_track(hex_data: &str) -> DecodedTrack {
    let bytes = hex_data
        .as_bytes()
        .chunks_exact(2)
        .filter_map(|pair| {
            let mut byte = [0u8; 1];
            hex::decode_to_slice(pair, &mut byte).ok().map(|_| byte[0])
        })
        .collect();

    DecodedTrack::new(bytes)
}

//! The head-object metadata model: xattr keys and their fixed-width
//! decimal encoding.

use crate::error::StriperError;

pub const XATTR_SIZE: &str = "striper.size";
pub const XATTR_ALLOCATED: &str = "striper.allocated";
pub const XATTR_VERSION: &str = "striper.version";
pub const XATTR_LAYOUT_STRIPE_UNIT: &str = "striper.layout.stripe_unit";
pub const XATTR_LAYOUT_STRIPE_COUNT: &str = "striper.layout.stripe_count";
pub const XATTR_LAYOUT_OBJECT_SIZE: &str = "striper.layout.object_size";

pub const LOCK_NAME: &str = "striper.lock";
pub const LOCK_DESCRIPTION: &str = "SimpleRADOSStriper";

const ENCODED_WIDTH: usize = 16;

/// Encode a `u64` as exactly 16 lowercase decimal ASCII digits,
/// zero-padded. This is the one and only wire format for a xattr value;
/// implementers must preserve it exactly for interoperability.
pub fn encode_u64(v: u64) -> Vec<u8> {
    format!("{v:0width$}", width = ENCODED_WIDTH).into_bytes()
}

/// Decode a 16-digit decimal ASCII xattr value. Any other width, or any
/// non-digit byte, is rejected as `BadMetadata`. Whether that is a
/// recoverable error or a violated invariant depends on the call site.
pub fn decode_u64(raw: &[u8]) -> Result<u64, StriperError> {
    if raw.len() != ENCODED_WIDTH {
        return Err(StriperError::BadMetadata(format!(
            "xattr value is {} bytes, expected {ENCODED_WIDTH}",
            raw.len()
        )));
    }
    let s = std::str::from_utf8(raw)
        .map_err(|_| StriperError::BadMetadata("xattr value is not valid UTF-8".into()))?;
    s.parse::<u64>()
        .map_err(|_| StriperError::BadMetadata(format!("xattr value {s:?} is not decimal")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_as_16_zero_padded_digits() {
        assert_eq!(encode_u64(0), b"0000000000000000");
        assert_eq!(encode_u64(42), b"0000000000000042");
        assert_eq!(encode_u64(u64::MAX), b"18446744073709551615");
        // u64::MAX is 20 digits, wider than the nominal width: format!
        // never truncates, so decode must still reject it on the way back.
        assert!(decode_u64(&encode_u64(u64::MAX)).is_err());
    }

    #[test]
    fn round_trips_typical_values() {
        for v in [0u64, 1, 4096, 1 << 27, 123456789] {
            let enc = encode_u64(v);
            assert_eq!(enc.len(), 16);
            assert_eq!(decode_u64(&enc).unwrap(), v);
        }
    }

    #[test]
    fn rejects_wrong_width() {
        assert!(decode_u64(b"123").is_err());
        assert!(decode_u64(b"00000000000000001").is_err()); // 17 chars
    }

    #[test]
    fn rejects_non_decimal() {
        assert!(decode_u64(b"000000000000ffaa").is_err());
        assert!(decode_u64(b"-00000000000001").is_err());
    }
}

//! Fixed-width argument encoding for the oracle contract
//!
//! The contract stores keys and identifiers in 32-byte slots. Shorter values are written as
//! `value-XXX…` so the slot is always full; a value that already fills the slot is stored as-is.
use super::error::EncodingError;

pub const SLOT_WIDTH: usize = 32;
const SEPARATOR: char = '-';
const PAD: char = 'X';

/// Encode `value` into exactly `width` bytes. Length is counted in UTF-8 bytes.
pub fn encode_fixed(value: &str, width: usize) -> Result<Vec<u8>, EncodingError> {
    let len = value.len();
    if len == width {
        return Ok(value.as_bytes().to_vec());
    }
    if len > width {
        return Err(EncodingError::Overflow {
            value: value.to_string(),
            len,
            width,
        });
    }

    let mut out = String::with_capacity(width);
    out.push_str(value);
    out.push(SEPARATOR);
    out.extend(std::iter::repeat_n(PAD, width - len - 1));

    Ok(out.into_bytes())
}

pub fn encode_fixed32(value: &str) -> Result<[u8; SLOT_WIDTH], EncodingError> {
    let bytes = encode_fixed(value, SLOT_WIDTH)?;
    let mut slot = [0u8; SLOT_WIDTH];
    slot.copy_from_slice(&bytes);
    Ok(slot)
}

/// Inverse of [`encode_fixed`]: strips a trailing `-X…` pad when one is present.
pub fn decode_fixed(slot: &[u8]) -> Result<String, EncodingError> {
    let text = std::str::from_utf8(slot).map_err(|_| EncodingError::NotUtf8)?;
    let value = match text.rsplit_once(SEPARATOR) {
        Some((value, pad)) if pad.chars().all(|c| c == PAD) => value,
        _ => text,
    };
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_values() {
        let encoded = encode_fixed("ABC", 32).unwrap();
        let expected = format!("ABC-{}", "X".repeat(28));

        assert_eq!(encoded.len(), 32);
        assert_eq!(encoded, expected.as_bytes());
    }

    #[test]
    fn empty_value_is_all_padding() {
        let encoded = encode_fixed("", 32).unwrap();
        assert_eq!(encoded, format!("-{}", "X".repeat(31)).as_bytes());
    }

    #[test]
    fn thirty_one_bytes_leaves_room_for_the_separator_only() {
        let value = "A".repeat(31);
        let encoded = encode_fixed(&value, 32).unwrap();
        assert_eq!(encoded, format!("{value}-").as_bytes());
    }

    #[test]
    fn exact_width_is_stored_verbatim() {
        let value = "B".repeat(32);
        assert_eq!(encode_fixed(&value, 32).unwrap(), value.as_bytes());
    }

    #[test]
    fn overflow_is_an_error() {
        let value = "C".repeat(33);
        assert_eq!(
            encode_fixed(&value, 32),
            Err(EncodingError::Overflow {
                value,
                len: 33,
                width: 32
            })
        );
    }

    #[test]
    fn width_counts_utf8_bytes() {
        // 11 three-byte characters: 33 bytes
        let value = "€".repeat(11);
        assert!(matches!(
            encode_fixed(&value, 32),
            Err(EncodingError::Overflow { len: 33, .. })
        ));
        assert_eq!(encode_fixed("€", 32).unwrap().len(), 32);
    }

    #[test]
    fn decode_strips_padding() {
        let slot = encode_fixed32("PO123").unwrap();
        assert_eq!(decode_fixed(&slot).unwrap(), "PO123");
        assert_eq!(decode_fixed(b"ITEM-1-XXX").unwrap(), "ITEM-1");
        assert_eq!(decode_fixed(b"NO-PAD-HERE").unwrap(), "NO-PAD-HERE");
    }

    #[test]
    fn exact_width_value_reencodes_to_itself() {
        // Looks padded, so decoding trims it; re-encoding restores the same slot.
        let value = format!("PO-{}", "X".repeat(29));
        let slot = encode_fixed(&value, 32).unwrap();
        let decoded = decode_fixed(&slot).unwrap();

        assert_eq!(decoded, "PO");
        assert_eq!(encode_fixed(&decoded, 32).unwrap(), slot);
    }
}

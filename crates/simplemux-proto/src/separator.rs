//! The one- or two-byte length separator that prefixes each payload inside a
//! bundle.
//!
//! Layout (MSB first over the wire):
//!
//! ```text
//! one byte:   0 0 b5 b4 b3 b2 b1 b0                  (length < 64)
//! two bytes:  0 1 b13 b12 b11 b10 b9 b8   b7..b0      (64 <= length <= 16383)
//! ```
//!
//! Bit 7 of the first byte is always 0 and doubles as a framing-validity
//! marker: any separator byte with bit 7 set is not a Simplemux separator at
//! all, and the whole bundle is rejected (see [`decode`]). Bit 6 is the
//! Present-Following-Flag (PFF): 0 selects the one-byte form, 1 the two-byte
//! form.

use crate::error::{ProtoError, Result};

/// Smallest length that requires the two-byte separator form.
pub const TWO_BYTE_THRESHOLD: usize = 64;

/// Largest length the codec can frame (14 bits: `0x3F << 8 | 0xFF`).
pub const MAX_LENGTH: usize = 16383;

const VALIDITY_BIT: u8 = 0x80;
const PFF_BIT: u8 = 0x40;
const LOW6_MASK: u8 = 0x3F;

/// Number of bytes [`encode`] would write for `length`, without writing them.
///
/// Used by the accumulator to predict a bundle's serialized size before
/// committing a payload to it (§4.2 step 1).
///
/// # Errors
///
/// Returns [`ProtoError::LengthOutOfRange`] if `length` is 0 or exceeds
/// [`MAX_LENGTH`].
pub fn sep_len(length: usize) -> Result<usize> {
    if length == 0 || length > MAX_LENGTH {
        return Err(ProtoError::LengthOutOfRange(length));
    }
    Ok(if length < TWO_BYTE_THRESHOLD { 1 } else { 2 })
}

/// Encode `length` as a one- or two-byte separator, appending it to `out`.
///
/// # Errors
///
/// Returns [`ProtoError::LengthOutOfRange`] if `length` is 0 or exceeds
/// [`MAX_LENGTH`] (i.e. `1 <= length <= 16383`).
pub fn encode(length: usize, out: &mut Vec<u8>) -> Result<()> {
    match sep_len(length)? {
        1 => {
            #[allow(clippy::cast_possible_truncation)]
            out.push(length as u8 & LOW6_MASK);
            Ok(())
        },
        _ => {
            #[allow(clippy::cast_possible_truncation)]
            let high = ((length >> 8) as u8) & LOW6_MASK;
            #[allow(clippy::cast_possible_truncation)]
            let low = (length & 0xFF) as u8;
            out.push(PFF_BIT | high);
            out.push(low);
            Ok(())
        },
    }
}

/// Decode a separator from the start of `bytes`, returning the declared
/// length and the number of bytes consumed (1 or 2).
///
/// This only validates the separator itself. The caller (the demultiplexer)
/// is responsible for checking that `length` bytes actually remain in the
/// datagram afterwards (§4.1's "post-check").
///
/// # Errors
///
/// - [`ProtoError::BadSeparator`] if the first byte has bit 7 set.
/// - [`ProtoError::TruncatedSeparator`] if PFF = 1 but no second byte
///   follows.
pub fn decode(bytes: &[u8]) -> Result<(usize, usize)> {
    let &first = bytes.first().ok_or(ProtoError::TruncatedSeparator)?;

    if first & VALIDITY_BIT != 0 {
        return Err(ProtoError::BadSeparator);
    }

    if first & PFF_BIT == 0 {
        return Ok(((first & LOW6_MASK) as usize, 1));
    }

    let &second = bytes.get(1).ok_or(ProtoError::TruncatedSeparator)?;
    let length = ((first & LOW6_MASK) as usize) << 8 | second as usize;
    Ok((length, 2))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn boundary_one_byte_at_63() {
        assert_eq!(sep_len(63).unwrap(), 1);
        let mut buf = Vec::new();
        encode(63, &mut buf).unwrap();
        assert_eq!(buf.len(), 1);
        assert_eq!(decode(&buf).unwrap(), (63, 1));
    }

    #[test]
    fn boundary_two_byte_at_64() {
        assert_eq!(sep_len(64).unwrap(), 2);
        let mut buf = Vec::new();
        encode(64, &mut buf).unwrap();
        assert_eq!(buf.len(), 2);
        assert_eq!(decode(&buf).unwrap(), (64, 2));
    }

    #[test]
    fn boundary_max_length() {
        let mut buf = Vec::new();
        encode(MAX_LENGTH, &mut buf).unwrap();
        assert_eq!(decode(&buf).unwrap(), (MAX_LENGTH, 2));
    }

    #[test]
    fn rejects_zero_and_overflow() {
        assert!(matches!(sep_len(0), Err(ProtoError::LengthOutOfRange(0))));
        assert!(matches!(sep_len(MAX_LENGTH + 1), Err(ProtoError::LengthOutOfRange(_))));
    }

    #[test]
    fn rejects_validity_bit_set() {
        let bytes = [0x80u8, 0x00];
        assert_eq!(decode(&bytes), Err(ProtoError::BadSeparator));
    }

    #[test]
    fn hundred_byte_payload_uses_two_byte_separator() {
        // 100 >= TWO_BYTE_THRESHOLD (64), so per the §4.1 bit layout (and the
        // boundary behaviors "length=64 => two-byte separator") this takes
        // the two-byte form, not the one-byte form.
        let mut buf = Vec::new();
        encode(100, &mut buf).unwrap();
        assert_eq!(buf.len(), 2);
        assert_eq!(decode(&buf).unwrap(), (100, 2));
    }

    #[test]
    fn truncated_two_byte_separator() {
        let bytes = [0x40u8]; // PFF set, no second byte
        assert_eq!(decode(&bytes), Err(ProtoError::TruncatedSeparator));
    }

    #[test]
    fn empty_buffer_is_truncated() {
        assert_eq!(decode(&[]), Err(ProtoError::TruncatedSeparator));
    }

    proptest! {
        #[test]
        fn round_trip(length in 1usize..=MAX_LENGTH) {
            let mut buf = Vec::new();
            encode(length, &mut buf).unwrap();
            let (decoded, consumed) = decode(&buf).unwrap();
            prop_assert_eq!(decoded, length);
            prop_assert_eq!(consumed, sep_len(length).unwrap());
            prop_assert_eq!(consumed, buf.len());
        }

        #[test]
        fn never_sets_validity_bit(length in 1usize..=MAX_LENGTH) {
            let mut buf = Vec::new();
            encode(length, &mut buf).unwrap();
            prop_assert_eq!(buf[0] & VALIDITY_BIT, 0);
        }
    }
}

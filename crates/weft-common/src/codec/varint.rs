//! Unsigned LEB128 variable-length integers.
//!
//! Each byte carries seven bits of the value, least significant group first, with
//! the high bit set on every byte except the last.

/// Longest possible encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Errors from decoding a varint
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum VarintError {
    /// Input ended while the continuation bit was still set
    #[error("varint truncated after {consumed} bytes")]
    #[diagnostic(
        code(weft::codec::varint::truncated),
        help("the final byte of a varint must have its high bit clear")
    )]
    Truncated {
        /// Bytes read before running out
        consumed: usize,
    },
    /// Value does not fit in a `u64`
    #[error("varint overflows u64")]
    #[diagnostic(code(weft::codec::varint::overflow))]
    Overflow,
}

/// Encode `value` as a standalone varint.
pub fn encode(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(value));
    encode_into(value, &mut out);
    out
}

/// Append the varint encoding of `value` to `buf`.
pub fn encode_into(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push(((value as u8) & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Number of bytes `encode(value)` produces.
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Decode a varint from the front of `data`.
///
/// Returns the value and the number of bytes consumed; anything after that is left
/// for the caller.
pub fn decode(data: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    for (i, byte) in data.iter().copied().enumerate() {
        if byte < 0x80 {
            if i > 9 || (i == 9 && byte > 1) {
                return Err(VarintError::Overflow);
            }
            return Ok((value | ((byte as u64) << shift), i + 1));
        }
        if i >= MAX_VARINT_LEN - 1 {
            return Err(VarintError::Overflow);
        }
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
    }
    Err(VarintError::Truncated {
        consumed: data.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_values() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(1), vec![0x01]);
        assert_eq!(encode(0x70), vec![0x70]);
        assert_eq!(encode(0x7F), vec![0x7F]);
    }

    #[test]
    fn multi_byte_values() {
        assert_eq!(encode(0x80), vec![0x80, 0x01]);
        assert_eq!(encode(300), vec![0xAC, 0x02]);
        // p256-pub multicodec
        assert_eq!(encode(0x1200), vec![0x80, 0x24]);
        assert_eq!(encode(u64::MAX).len(), MAX_VARINT_LEN);
    }

    #[test]
    fn encoded_len_matches_encode() {
        for v in [0, 1, 0x7F, 0x80, 0x3FFF, 0x4000, 1 << 35, u64::MAX] {
            assert_eq!(encoded_len(v), encode(v).len(), "value {v}");
        }
    }

    #[test]
    fn decode_reports_consumed_bytes() {
        assert_eq!(decode(&[0xAC, 0x02, 0xFF]), Ok((300, 2)));
        assert_eq!(decode(&[0x71, 0x12, 0x20]), Ok((0x71, 1)));
        assert_eq!(decode(&encode(u64::MAX)), Ok((u64::MAX, MAX_VARINT_LEN)));
    }

    #[test]
    fn empty_and_truncated_input() {
        assert_eq!(decode(&[]), Err(VarintError::Truncated { consumed: 0 }));
        assert_eq!(decode(&[0x80]), Err(VarintError::Truncated { consumed: 1 }));
        assert_eq!(
            decode(&[0xFF, 0xFF, 0xFF]),
            Err(VarintError::Truncated { consumed: 3 })
        );
    }

    #[test]
    fn overflow_is_rejected() {
        let mut too_big = vec![0xFF; 9];
        too_big.push(0x02);
        assert_eq!(decode(&too_big), Err(VarintError::Overflow));

        let too_long = vec![0x80; 11];
        assert_eq!(decode(&too_long), Err(VarintError::Overflow));
    }
}

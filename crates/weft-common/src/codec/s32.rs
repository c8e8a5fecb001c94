//! Sortable base32.
//!
//! Digits are drawn from [`ALPHABET`] in ascending ASCII order, so for strings of
//! equal length lexicographic order matches numeric order. Used to encode TIDs.

use smol_str::SmolStr;

/// The 32 digit symbols, index = digit value.
pub const ALPHABET: &[u8; 32] = b"234567abcdefghijklmnopqrstuvwxyz";

/// The symbol for digit zero, used for left padding.
pub const ZERO: char = '2';

/// Errors from decoding sortable base32
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum S32Error {
    /// A character outside the sortable base32 alphabet
    #[error("invalid base32-sortable character {ch:?} at index {index}")]
    #[diagnostic(
        code(weft::codec::s32::invalid_character),
        help("allowed characters are 2-7 and a-z")
    )]
    InvalidCharacter {
        /// The offending character
        ch: char,
        /// Its byte offset in the input
        index: usize,
    },
    /// Decoded value does not fit in a `u64`
    #[error("base32-sortable value overflows u64")]
    #[diagnostic(code(weft::codec::s32::overflow))]
    Overflow,
}

/// Digit value of an ASCII character, case-insensitive.
#[inline]
pub fn digit(c: u8) -> Option<u8> {
    match c.to_ascii_lowercase() {
        c @ b'2'..=b'7' => Some(c - b'2'),
        c @ b'a'..=b'z' => Some(c - b'a' + 6),
        _ => None,
    }
}

/// Encode `n` with no padding.
///
/// Zero encodes to the empty string; fixed-width callers pad with
/// [`encode_padded`].
pub fn encode(mut n: u64) -> SmolStr {
    let mut digits = [0u8; 13];
    let mut len = 0;
    while n > 0 {
        digits[len] = ALPHABET[(n & 0x1F) as usize];
        n >>= 5;
        len += 1;
    }
    digits[..len].iter().rev().map(|&b| b as char).collect()
}

/// Encode `n`, left-padded with [`ZERO`] to at least `width` characters.
pub fn encode_padded(n: u64, width: usize) -> SmolStr {
    let encoded = encode(n);
    if encoded.len() >= width {
        return encoded;
    }
    std::iter::repeat_n(ZERO, width - encoded.len())
        .chain(encoded.chars())
        .collect()
}

/// Decode a sortable base32 string, most significant digit first.
///
/// The empty string decodes to zero.
pub fn decode(s: &str) -> Result<u64, S32Error> {
    let mut value: u64 = 0;
    for (index, c) in s.char_indices() {
        let d = u8::try_from(c)
            .ok()
            .and_then(digit)
            .ok_or(S32Error::InvalidCharacter { ch: c, index })?;
        value = value
            .checked_mul(32)
            .and_then(|v| v.checked_add(d as u64))
            .ok_or(S32Error::Overflow)?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_empty() {
        assert_eq!(encode(0), "");
        assert_eq!(encode_padded(0, 2), "22");
        assert_eq!(decode(""), Ok(0));
    }

    #[test]
    fn small_values() {
        assert_eq!(encode(1), "3");
        assert_eq!(encode(31), "z");
        assert_eq!(encode(32), "32");
        assert_eq!(decode("z"), Ok(31));
        assert_eq!(decode("32"), Ok(32));
    }

    #[test]
    fn padding_never_truncates() {
        assert_eq!(encode_padded(31, 2), "2z");
        assert_eq!(encode_padded(32 * 32, 2), "322");
    }

    #[test]
    fn case_insensitive_decode() {
        assert_eq!(decode("3JZFCIJPJ2Z"), decode("3jzfcijpj2z"));
    }

    #[test]
    fn invalid_characters() {
        assert_eq!(
            decode("ab1"),
            Err(S32Error::InvalidCharacter { ch: '1', index: 2 })
        );
        assert_eq!(
            decode("8"),
            Err(S32Error::InvalidCharacter { ch: '8', index: 0 })
        );
        assert!(matches!(
            decode("é"),
            Err(S32Error::InvalidCharacter { ch: 'é', .. })
        ));
    }

    #[test]
    fn overflow() {
        // 13 digits hold 65 bits
        assert_eq!(decode("zzzzzzzzzzzzz"), Err(S32Error::Overflow));
        assert_eq!(decode("jzzzzzzzzzzzz"), Ok(u64::MAX));
    }

    #[test]
    fn symmetric_below_eleven_digits() {
        let max = 32u64.pow(11) - 1;
        for n in [0, 1, 31, 32, 1023, 1 << 40, max / 3, max - 1, max] {
            assert_eq!(decode(&encode(n)), Ok(n), "value {n}");
            assert!(encode(n).len() <= 11);
        }
    }

    #[test]
    fn sort_order_matches_numeric_order() {
        let values = [0u64, 5, 31, 32, 1000, 1 << 30, 1 << 50];
        let encoded: Vec<_> = values.iter().map(|&v| encode_padded(v, 11)).collect();
        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
    }
}

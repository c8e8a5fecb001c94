//! Multibase prefixes for CID strings.
//!
//! The first character of a multibase string names the alphabet the rest is written
//! in. CIDs only need a few of them, and anything else is rejected up front rather
//! than handed to a decoder for a base we never emit.

pub use multibase::Base;

/// Bases accepted when decoding.
pub const SUPPORTED_BASES: &[Base] = &[Base::Base32Lower, Base::Base32Upper, Base::Base58Btc];

/// Errors from decoding a multibase string
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum MultibaseError {
    /// No prefix character to read
    #[error("empty multibase string")]
    #[diagnostic(code(weft::codec::multibase::empty))]
    Empty,
    /// Prefix character is unknown or names a base we don't accept
    #[error("unsupported multibase encoding {0:?}")]
    #[diagnostic(
        code(weft::codec::multibase::unsupported),
        help("supported prefixes are `b`/`B` (base32) and `z` (base58btc)")
    )]
    UnsupportedEncoding(char),
    /// Body is not valid in the selected base
    #[error("invalid {base:?} data")]
    #[diagnostic(code(weft::codec::multibase::decode))]
    Decode {
        /// The base named by the prefix
        base: Base,
        /// Error from the underlying decoder
        #[source]
        source: multibase::Error,
    },
}

/// Decode a multibase string, returning the base it was written in and its bytes.
pub fn decode(input: &str) -> Result<(Base, Vec<u8>), MultibaseError> {
    let code = input.chars().next().ok_or(MultibaseError::Empty)?;
    let base = Base::from_code(code).map_err(|_| MultibaseError::UnsupportedEncoding(code))?;
    if !SUPPORTED_BASES.contains(&base) {
        return Err(MultibaseError::UnsupportedEncoding(code));
    }
    let body = &input[code.len_utf8()..];
    let bytes = base
        .decode(body)
        .map_err(|source| MultibaseError::Decode { base, source })?;
    Ok((base, bytes))
}

/// Decode text in `base` that carries no prefix character (e.g. a CIDv0 string).
pub fn decode_bare(base: Base, input: &str) -> Result<Vec<u8>, MultibaseError> {
    base.decode(input)
        .map_err(|source| MultibaseError::Decode { base, source })
}

/// Encode `bytes` in `base`, prefix character included.
pub fn encode(base: Base, bytes: impl AsRef<[u8]>) -> String {
    multibase::encode(base, bytes)
}

/// Encode `bytes` in `base` with no prefix character.
pub fn encode_bare(base: Base, bytes: impl AsRef<[u8]>) -> String {
    base.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_selects_base() {
        let bytes = [0x01, 0x71, 0x12, 0x20, 0xAB];
        for base in SUPPORTED_BASES {
            let encoded = encode(*base, bytes);
            assert_eq!(encoded.chars().next(), Some(base.code()));
            let (decoded_base, decoded) = decode(&encoded).unwrap();
            assert_eq!(decoded_base, *base);
            assert_eq!(decoded, bytes);
        }
    }

    #[test]
    fn base32_is_lowercase_without_padding() {
        assert_eq!(encode(Base::Base32Lower, b"f"), "bmy");
        assert_eq!(encode_bare(Base::Base32Lower, b"foobar"), "mzxw6ytboi");
    }

    #[test]
    fn empty_input() {
        assert!(matches!(decode(""), Err(MultibaseError::Empty)));
    }

    #[test]
    fn unsupported_prefixes() {
        // base64 is a real multibase but not one a CID string may use here
        assert!(matches!(
            decode("mAXESIA"),
            Err(MultibaseError::UnsupportedEncoding('m'))
        ));
        assert!(matches!(
            decode("!abc"),
            Err(MultibaseError::UnsupportedEncoding('!'))
        ));
    }

    #[test]
    fn malformed_body() {
        // '0' is not in the base58btc alphabet
        assert!(matches!(
            decode("z0OIl"),
            Err(MultibaseError::Decode {
                base: Base::Base58Btc,
                ..
            })
        ));
        assert!(matches!(
            decode("b1189"),
            Err(MultibaseError::Decode {
                base: Base::Base32Lower,
                ..
            })
        ));
    }
}

use crate::types::Literal;
use crate::types::string::AtStrError;
use crate::{CowStr, IntoStatic};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::{SmolStr, ToSmolStr};
use std::fmt;
use std::marker::PhantomData;
use std::sync::LazyLock;
use std::{ops::Deref, str::FromStr};

/// Trait for generic typed record keys
///
/// Public so that consumers can define specialized record key types, but unsafe,
/// because the implementer must guarantee that `as_str()` always returns a string
/// satisfying the [record key grammar](https://atproto.com/specs/record-key), as
/// checked by [`Rkey::new`].
///
/// This crate provides implementations for TID, NSID, literals, and generic strings
pub unsafe trait RecordKeyType: Clone + Serialize {
    /// The key as it appears in a repo path.
    fn as_str(&self) -> &str;
}

/// A record key of a particular flavour.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash, Debug)]
#[serde(transparent)]
#[repr(transparent)]
pub struct RecordKey<T: RecordKeyType>(pub T);

impl<T: RecordKeyType> RecordKey<T> {
    /// The key as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Unwrap the typed key.
    pub fn into_inner(self) -> T {
        self.0
    }

    /// View as an untyped record key, borrowing the string.
    pub fn as_rkey(&self) -> RecordKey<Rkey<'_>> {
        // invariant upheld by RecordKeyType
        RecordKey(Rkey(CowStr::Borrowed(self.0.as_str())))
    }
}

impl<'r> RecordKey<Rkey<'r>> {
    /// Fallible constructor for an untyped record key, borrows from input
    pub fn any(rkey: &'r str) -> Result<Self, AtStrError> {
        Rkey::new(rkey).map(RecordKey)
    }
}

impl<T: RecordKeyType> From<T> for RecordKey<T> {
    fn from(value: T) -> Self {
        RecordKey(value)
    }
}

impl<T> AsRef<str> for RecordKey<T>
where
    T: RecordKeyType,
{
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl<T: RecordKeyType> fmt::Display for RecordKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl<T> IntoStatic for RecordKey<T>
where
    T: IntoStatic + RecordKeyType,
    T::Output: RecordKeyType,
{
    type Output = RecordKey<T::Output>;

    fn into_static(self) -> Self::Output {
        RecordKey(self.0.into_static())
    }
}

/// ATProto Record Key (type `any`)
///
/// Catch-all for any string meeting the overall record key requirements.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Hash)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Rkey<'r>(CowStr<'r>);

unsafe impl RecordKeyType for Rkey<'_> {
    fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Maximum length of a record key, in bytes.
pub const MAX_RKEY_LEN: usize = 512;

/// Values that match the character set but are reserved.
pub const RESERVED_RKEYS: &[&str] = &[".", ".."];

/// Record key character set and length. `.` and `..` pass it and are rejected separately.
pub static RKEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.\-_:~]{1,512}$").unwrap());

fn is_rkey_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '~')
}

/// Length, then character set, then the reserved values. `.` and `..` pass the
/// pattern, so they are only rejected once it has matched.
pub(crate) fn validate(rkey: &str) -> Result<(), AtStrError> {
    if rkey.is_empty() {
        return Err(AtStrError::too_short("record-key", rkey, 1, 0));
    }
    if rkey.len() > MAX_RKEY_LEN {
        return Err(AtStrError::too_long(
            "record-key",
            rkey,
            MAX_RKEY_LEN,
            rkey.len(),
        ));
    }
    if !RKEY_REGEX.is_match(rkey) {
        return Err(match rkey.char_indices().find(|&(_, c)| !is_rkey_char(c)) {
            Some((i, c)) => AtStrError::bad_char("record-key", rkey, i, c),
            None => AtStrError::regex(
                "record-key",
                rkey,
                SmolStr::new_static("doesn't match 'any' schema"),
            ),
        });
    }
    if RESERVED_RKEYS.contains(&rkey) {
        return Err(AtStrError::reserved("record-key", rkey));
    }
    Ok(())
}

/// AT Protocol rkey
impl<'r> Rkey<'r> {
    /// Fallible constructor, validates, borrows from input
    pub fn new(rkey: &'r str) -> Result<Self, AtStrError> {
        validate(rkey)?;
        Ok(Self(CowStr::Borrowed(rkey)))
    }

    /// Fallible constructor, validates, takes ownership
    pub fn new_owned(rkey: impl AsRef<str>) -> Result<Rkey<'static>, AtStrError> {
        let rkey = rkey.as_ref();
        validate(rkey)?;
        Ok(Rkey(CowStr::copy_from_str(rkey)))
    }

    /// Fallible constructor, validates, doesn't allocate
    pub fn new_static(rkey: &'static str) -> Result<Rkey<'static>, AtStrError> {
        validate(rkey)?;
        Ok(Rkey(CowStr::new_static(rkey)))
    }

    /// Fallible constructor from an existing CowStr
    pub fn from_cowstr(rkey: CowStr<'r>) -> Result<Self, AtStrError> {
        validate(&rkey)?;
        Ok(Self(rkey))
    }

    /// Infallible constructor for when you *know* the string is a valid rkey.
    ///
    /// # Panics
    ///
    /// Panics with the validation error if `rkey` is not a valid record key.
    pub fn raw(rkey: &'r str) -> Self {
        match validate(rkey) {
            Ok(()) => Self(CowStr::Borrowed(rkey)),
            Err(e) => panic!("invalid record key: {e}"),
        }
    }

    /// Infallible constructor for when you *know* the string is a valid rkey.
    ///
    /// # Safety
    ///
    /// The caller upholds the record key grammar; nothing is checked.
    pub unsafe fn unchecked(rkey: &'r str) -> Self {
        Self(CowStr::Borrowed(rkey))
    }

    /// Returns the record key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Rkey<'_> {
    type Err = AtStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rkey::new_owned(s)
    }
}

impl TryFrom<String> for Rkey<'static> {
    type Error = AtStrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rkey::new_owned(value)
    }
}

impl IntoStatic for Rkey<'_> {
    type Output = Rkey<'static>;

    fn into_static(self) -> Self::Output {
        Rkey(self.0.into_static())
    }
}

impl<'de, 'a> Deserialize<'de> for Rkey<'a>
where
    'de: 'a,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: CowStr<'a> = Deserialize::deserialize(deserializer)?;
        Self::from_cowstr(value).map_err(D::Error::custom)
    }
}

impl fmt::Display for Rkey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Rkey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record-key:{}", self.0)
    }
}

impl From<Rkey<'_>> for String {
    fn from(value: Rkey<'_>) -> Self {
        value.0.to_string()
    }
}

impl<'r> From<Rkey<'r>> for CowStr<'r> {
    fn from(value: Rkey<'r>) -> Self {
        value.0
    }
}

impl From<Rkey<'_>> for SmolStr {
    fn from(value: Rkey) -> Self {
        value.0.to_smolstr()
    }
}

impl AsRef<str> for Rkey<'_> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Rkey<'_> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

/// ATProto Record Key (type `literal:<value>`)
///
/// Zero-sized; the literal is the associated constant of the type parameter.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LiteralKey<T: Literal = SelfRecord> {
    literal: PhantomData<T>,
}

/// The `self` literal, used for singleton records such as profiles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SelfRecord;

impl Literal for SelfRecord {
    const LITERAL: &'static str = "self";
}

unsafe impl<T: Literal> RecordKeyType for LiteralKey<T> {
    fn as_str(&self) -> &str {
        T::LITERAL
    }
}

impl<T: Literal> LiteralKey<T> {
    /// Fallible constructor: the input must equal the literal exactly.
    pub fn new(rkey: impl AsRef<str>) -> Result<Self, AtStrError> {
        let rkey = rkey.as_ref();
        validate(rkey)?;
        if rkey != T::LITERAL {
            return Err(AtStrError::regex(
                "record-key",
                rkey,
                smol_str::format_smolstr!("expected literal `{}`", T::LITERAL),
            ));
        }
        Ok(Self {
            literal: PhantomData,
        })
    }

    /// The literal key. Validity of `T::LITERAL` is checked in debug builds.
    pub fn literal() -> Self {
        debug_assert!(validate(T::LITERAL).is_ok());
        Self {
            literal: PhantomData,
        }
    }

    /// The literal itself.
    pub fn as_str(&self) -> &str {
        T::LITERAL
    }
}

impl<T: Literal> Serialize for LiteralKey<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(T::LITERAL)
    }
}

impl<T: Literal> FromStr for LiteralKey<T> {
    type Err = AtStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de, T: Literal> Deserialize<'de> for LiteralKey<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: CowStr<'de> = Deserialize::deserialize(deserializer)?;
        Self::new(value).map_err(D::Error::custom)
    }
}

impl<T: Literal> fmt::Display for LiteralKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(T::LITERAL)
    }
}

impl<T: Literal> fmt::Debug for LiteralKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "literal:{}", T::LITERAL)
    }
}

impl<T: Literal> IntoStatic for LiteralKey<T> {
    type Output = LiteralKey<T>;

    fn into_static(self) -> Self::Output {
        self
    }
}

impl<T: Literal> AsRef<str> for LiteralKey<T> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::string::StrParseKind;

    #[test]
    fn valid_rkeys() {
        for s in ["self", "~1.2-3_", "3jzfcijpj2z2a", "a:b", "example.com", "..."] {
            let rkey = Rkey::new(s).unwrap_or_else(|e| panic!("{s}: {e}"));
            assert_eq!(rkey.to_string(), s);
        }
        let max = "o".repeat(MAX_RKEY_LEN);
        assert!(Rkey::new(&max).is_ok());
    }

    #[test]
    fn invalid_rkeys() {
        for s in ["", "a/b", "/", "a b", "a#b", "a?b", "caf\u{e9}"] {
            assert!(Rkey::new(s).is_err(), "{s:?}");
        }
        let over = "o".repeat(MAX_RKEY_LEN + 1);
        let err = Rkey::new(&over).unwrap_err();
        assert!(matches!(
            err.kind,
            StrParseKind::TooLong {
                max: 512,
                actual: 513
            }
        ));
    }

    #[test]
    fn reserved_values() {
        for s in [".", ".."] {
            let err = Rkey::new(s).unwrap_err();
            assert!(
                matches!(err.kind, StrParseKind::Disallowed { .. }),
                "{s}: {err}"
            );
            assert!(err.to_string().contains("reserved"));
        }
    }

    #[test]
    fn empty_is_too_short() {
        let err = Rkey::new("").unwrap_err();
        assert!(matches!(err.kind, StrParseKind::TooShort { min: 1, actual: 0 }));
        assert!(Rkey::new("").ok().is_none());
    }

    #[test]
    fn slash_is_located() {
        let err = Rkey::new("abc/def").unwrap_err();
        match err.kind {
            StrParseKind::Disallowed {
                problem: Some(span),
                ..
            } => assert_eq!(span.offset(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn literal_keys() {
        let key: LiteralKey<SelfRecord> = "self".parse().unwrap();
        assert_eq!(key.as_str(), "self");
        assert!(LiteralKey::<SelfRecord>::new("Self").is_err());
        assert!(LiteralKey::<SelfRecord>::new("other").is_err());
        assert_eq!(
            RecordKey(LiteralKey::<SelfRecord>::literal()).as_rkey(),
            RecordKey::any("self").unwrap()
        );
    }

    #[test]
    fn serde_contract() {
        let rkey: RecordKey<Rkey> = serde_json::from_str(r#""3jzfcijpj2z2a""#).unwrap();
        assert_eq!(rkey.as_str(), "3jzfcijpj2z2a");
        assert!(serde_json::from_str::<Rkey>(r#"".."""#).is_err());
        assert_eq!(serde_json::to_string(&rkey).unwrap(), r#""3jzfcijpj2z2a""#);
    }
}

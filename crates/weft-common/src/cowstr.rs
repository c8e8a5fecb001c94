use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{
    borrow::Cow,
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
};

use crate::IntoStatic;

/// A copy-on-write immutable string.
///
/// [`Cow<str>`] can't be used directly because its owned side is `String`; identifiers
/// are short and cloned often, so the owned side here is a [`SmolStr`], which inlines
/// anything up to 23 bytes and is cheap to clone otherwise.
#[derive(Clone)]
pub enum CowStr<'s> {
    /// Borrowed from the input
    Borrowed(&'s str),
    /// Owned, inline or reference counted
    Owned(SmolStr),
}

impl CowStr<'static> {
    /// Copy a string slice into an owned `CowStr`.
    pub fn copy_from_str(s: &str) -> Self {
        Self::Owned(SmolStr::new(s))
    }

    /// Owned `CowStr` from a static string, without allocating.
    pub fn new_static(s: &'static str) -> Self {
        Self::Owned(SmolStr::new_static(s))
    }
}

impl<'s> CowStr<'s> {
    /// Borrow a byte slice as UTF-8.
    #[inline]
    pub fn from_utf8(s: &'s [u8]) -> Result<Self, std::str::Utf8Error> {
        Ok(Self::Borrowed(std::str::from_utf8(s)?))
    }

    /// Returns the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            CowStr::Borrowed(s) => s,
            CowStr::Owned(s) => s.as_str(),
        }
    }

    /// Whether this value borrows from somewhere else.
    #[inline]
    pub fn is_borrowed(&self) -> bool {
        matches!(self, CowStr::Borrowed(_))
    }
}

impl AsRef<str> for CowStr<'_> {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for CowStr<'_> {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl<'s> From<&'s str> for CowStr<'s> {
    #[inline]
    fn from(s: &'s str) -> Self {
        CowStr::Borrowed(s)
    }
}

impl From<String> for CowStr<'_> {
    #[inline]
    fn from(s: String) -> Self {
        CowStr::Owned(SmolStr::from(s))
    }
}

impl From<SmolStr> for CowStr<'_> {
    #[inline]
    fn from(s: SmolStr) -> Self {
        CowStr::Owned(s)
    }
}

impl<'a> From<Cow<'a, str>> for CowStr<'a> {
    #[inline]
    fn from(s: Cow<'a, str>) -> Self {
        match s {
            Cow::Borrowed(s) => CowStr::Borrowed(s),
            Cow::Owned(s) => CowStr::Owned(SmolStr::from(s)),
        }
    }
}

impl From<CowStr<'_>> for String {
    #[inline]
    fn from(s: CowStr<'_>) -> Self {
        s.as_str().to_owned()
    }
}

impl From<CowStr<'_>> for SmolStr {
    #[inline]
    fn from(s: CowStr<'_>) -> Self {
        match s {
            CowStr::Borrowed(s) => SmolStr::new(s),
            CowStr::Owned(s) => s,
        }
    }
}

impl Default for CowStr<'_> {
    #[inline]
    fn default() -> Self {
        CowStr::new_static("")
    }
}

impl<'a> PartialEq<CowStr<'a>> for CowStr<'_> {
    #[inline]
    fn eq(&self, other: &CowStr<'a>) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for CowStr<'_> {}

impl PartialEq<str> for CowStr<'_> {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for CowStr<'_> {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<CowStr<'_>> for &str {
    #[inline]
    fn eq(&self, other: &CowStr<'_>) -> bool {
        *self == other.as_str()
    }
}

impl PartialEq<String> for CowStr<'_> {
    #[inline]
    fn eq(&self, other: &String) -> bool {
        self.as_str() == other.as_str()
    }
}

impl PartialOrd for CowStr<'_> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CowStr<'_> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for CowStr<'_> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl fmt::Debug for CowStr<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for CowStr<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IntoStatic for CowStr<'_> {
    type Output = CowStr<'static>;

    #[inline]
    fn into_static(self) -> Self::Output {
        match self {
            CowStr::Borrowed(s) => CowStr::Owned(SmolStr::new(s)),
            CowStr::Owned(s) => CowStr::Owned(s),
        }
    }
}

impl Serialize for CowStr<'_> {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Visitor that borrows when the deserializer allows it and copies otherwise.
pub struct CowStrVisitor;

impl<'de> serde::de::Visitor<'de> for CowStrVisitor {
    type Value = CowStr<'de>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(CowStr::copy_from_str(v))
    }

    fn visit_borrowed_str<E>(self, v: &'de str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(CowStr::Borrowed(v))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(v.into())
    }
}

impl<'de, 'a> Deserialize<'de> for CowStr<'a>
where
    'de: 'a,
{
    fn deserialize<D>(deserializer: D) -> Result<CowStr<'a>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(CowStrVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_across_variants() {
        let borrowed = CowStr::Borrowed("did:plc:abc");
        let owned = CowStr::copy_from_str("did:plc:abc");

        assert_eq!(borrowed, owned);
        assert_eq!(borrowed, "did:plc:abc");
        assert_eq!("did:plc:abc", owned);
        assert!(borrowed.is_borrowed());
        assert!(!owned.is_borrowed());
    }

    #[test]
    fn into_static_detaches() {
        let input = String::from("app.bsky.feed.post");
        let detached = CowStr::Borrowed(input.as_str()).into_static();
        drop(input);
        assert_eq!(detached.as_str(), "app.bsky.feed.post");
    }

    #[test]
    fn deserializes_borrowed_from_json() {
        let json = r#""self""#;
        let s: CowStr<'_> = serde_json::from_str(json).unwrap();
        assert!(s.is_borrowed());
        assert_eq!(s, "self");
    }
}

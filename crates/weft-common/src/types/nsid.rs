use crate::types::recordkey::RecordKeyType;
use crate::types::string::AtStrError;
use crate::{CowStr, IntoStatic};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::{SmolStr, ToSmolStr};
use std::fmt;
use std::sync::LazyLock;
use std::{ops::Deref, str::FromStr};

/// Namespaced Identifier (NSID)
///
/// A reverse-DNS domain authority followed by a name, e.g. `app.bsky.feed.post`
/// has authority `app.bsky.feed` and name `post`. Identifies lexicon schemas and
/// record collections.
///
/// See <https://atproto.com/specs/nsid>.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Hash)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Nsid<'n>(CowStr<'n>);

/// Maximum total length: 253 for the authority, a dot, 63 for the name.
pub const MAX_NSID_LEN: usize = 317;

/// Maximum length of the domain authority.
pub const MAX_AUTHORITY_LEN: usize = 253;

/// Maximum length of any one segment.
pub const MAX_SEGMENT_LEN: usize = 63;

/// Minimum number of dot-separated segments.
pub const MIN_SEGMENTS: usize = 3;

/// Full NSID grammar.
pub static NSID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+(\.[a-zA-Z][a-zA-Z0-9]{0,62})$").unwrap()
});

/// Characters allowed anywhere in an NSID.
pub static NSID_CHARS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.-]+$").unwrap());

/// Checks run in order: length, character set, per-segment rules, then the full
/// grammar. The first failure is the one reported.
pub(crate) fn validate(nsid: &str) -> Result<(), AtStrError> {
    if nsid.is_empty() {
        return Err(AtStrError::too_short("nsid", nsid, 1, 0));
    }
    if nsid.len() > MAX_NSID_LEN {
        return Err(AtStrError::too_long("nsid", nsid, MAX_NSID_LEN, nsid.len()));
    }
    if !NSID_CHARS_REGEX.is_match(nsid) {
        return Err(match nsid
            .char_indices()
            .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '.' || c == '-'))
        {
            Some((i, c)) => AtStrError::bad_char("nsid", nsid, i, c),
            None => AtStrError::regex("nsid", nsid, SmolStr::new_static("invalid characters")),
        });
    }

    let segments: Vec<&str> = nsid.split('.').collect();
    if segments.len() < MIN_SEGMENTS {
        return Err(AtStrError::missing_from(
            "nsid",
            nsid,
            "at least three dot-separated segments",
            (nsid.len(), 0),
        ));
    }
    let last = segments.len() - 1;
    let mut start = 0;
    for (idx, segment) in segments.iter().enumerate() {
        let span = (start, segment.len());
        if segment.is_empty() {
            return Err(AtStrError::missing_from("nsid", nsid, "segment", span));
        }
        if segment.len() > MAX_SEGMENT_LEN {
            return Err(AtStrError::invalid_at(
                "nsid",
                nsid,
                span,
                smol_str::format_smolstr!(
                    "segment is {} characters, at most {MAX_SEGMENT_LEN} allowed",
                    segment.len()
                ),
            ));
        }
        if segment.starts_with('-') || segment.ends_with('-') {
            return Err(AtStrError::invalid_at(
                "nsid",
                nsid,
                span,
                "segments can't start or end with `-`",
            ));
        }
        if idx == 0 && segment.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(AtStrError::invalid_at(
                "nsid",
                nsid,
                (0, 1),
                "first segment can't start with a digit",
            ));
        }
        if idx == last {
            if let Some((i, c)) = segment
                .char_indices()
                .find(|&(_, c)| !c.is_ascii_alphanumeric())
            {
                return Err(AtStrError::bad_char("nsid", nsid, start + i, c));
            }
            if segment.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(AtStrError::invalid_at(
                    "nsid",
                    nsid,
                    (start, 1),
                    "name can't start with a digit",
                ));
            }
        }
        start += segment.len() + 1;
    }
    let authority_len = nsid.len() - segments[last].len() - 1;
    if authority_len > MAX_AUTHORITY_LEN {
        return Err(AtStrError::invalid_at(
            "nsid",
            nsid,
            (0, authority_len),
            smol_str::format_smolstr!(
                "domain authority is {authority_len} characters, at most {MAX_AUTHORITY_LEN} allowed"
            ),
        ));
    }

    if !NSID_REGEX.is_match(nsid) {
        return Err(AtStrError::regex(
            "nsid",
            nsid,
            SmolStr::new_static("invalid"),
        ));
    }
    Ok(())
}

impl<'n> Nsid<'n> {
    /// Fallible constructor, validates, borrows from input
    pub fn new(nsid: &'n str) -> Result<Self, AtStrError> {
        validate(nsid)?;
        Ok(Self(CowStr::Borrowed(nsid)))
    }

    /// Fallible constructor, validates, takes ownership
    pub fn new_owned(nsid: impl AsRef<str>) -> Result<Nsid<'static>, AtStrError> {
        let nsid = nsid.as_ref();
        validate(nsid)?;
        Ok(Nsid(CowStr::copy_from_str(nsid)))
    }

    /// Fallible constructor, validates, doesn't allocate
    pub fn new_static(nsid: &'static str) -> Result<Nsid<'static>, AtStrError> {
        validate(nsid)?;
        Ok(Nsid(CowStr::new_static(nsid)))
    }

    /// Fallible constructor from an existing CowStr
    pub fn from_cowstr(nsid: CowStr<'n>) -> Result<Self, AtStrError> {
        validate(&nsid)?;
        Ok(Self(nsid))
    }

    /// Infallible constructor for when you *know* the string is a valid NSID.
    ///
    /// # Panics
    ///
    /// Panics with the validation error if `nsid` is not a valid NSID.
    pub fn raw(nsid: &'n str) -> Self {
        match validate(nsid) {
            Ok(()) => Self(CowStr::Borrowed(nsid)),
            Err(e) => panic!("invalid NSID: {e}"),
        }
    }

    /// Infallible constructor for when you *know* the string is a valid NSID.
    ///
    /// # Safety
    ///
    /// The caller upholds the NSID grammar; nothing is checked.
    pub unsafe fn unchecked(nsid: &'n str) -> Self {
        Self(CowStr::Borrowed(nsid))
    }

    /// Returns the domain authority part of the NSID.
    pub fn domain_authority(&self) -> &str {
        match self.0.rfind('.') {
            Some(split) => &self.0[..split],
            None => "",
        }
    }

    /// Returns the name segment of the NSID.
    pub fn name(&self) -> &str {
        match self.0.rfind('.') {
            Some(split) => &self.0[split + 1..],
            None => self.as_str(),
        }
    }

    /// Dot-separated segments, authority first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Returns the NSID as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Nsid<'_> {
    type Err = AtStrError;

    /// Has to take ownership due to the lifetime constraints of the FromStr trait.
    /// Prefer `Nsid::new()` if you want to borrow.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Nsid::new_owned(s)
    }
}

impl TryFrom<String> for Nsid<'static> {
    type Error = AtStrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Nsid::new_owned(value)
    }
}

impl IntoStatic for Nsid<'_> {
    type Output = Nsid<'static>;

    fn into_static(self) -> Self::Output {
        Nsid(self.0.into_static())
    }
}

impl<'de, 'a> Deserialize<'de> for Nsid<'a>
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

impl fmt::Display for Nsid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Nsid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Nsid").field(&self.as_str()).finish()
    }
}

impl<'n> From<Nsid<'n>> for String {
    fn from(value: Nsid) -> Self {
        value.0.to_string()
    }
}

impl<'n> From<Nsid<'n>> for CowStr<'n> {
    fn from(value: Nsid<'n>) -> Self {
        value.0
    }
}

impl From<Nsid<'_>> for SmolStr {
    fn from(value: Nsid) -> Self {
        value.0.to_smolstr()
    }
}

impl AsRef<str> for Nsid<'_> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Nsid<'_> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

unsafe impl RecordKeyType for Nsid<'_> {
    fn as_str(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::string::StrParseKind;

    #[test]
    fn valid_nsids() {
        for s in [
            "com.example.foo",
            "app.bsky.feed.post",
            "com.atproto.repo.createRecord",
            "com.example.fooBar",
            "net.users.bob.ping",
            "a-0.b-1.c",
            "a.b.c",
            "cn.8.lex.stuff",
            "com.example.foo2",
        ] {
            let nsid = Nsid::new(s).unwrap_or_else(|e| panic!("{s}: {e}"));
            assert_eq!(nsid.to_string(), s);
        }
    }

    #[test]
    fn invalid_nsids() {
        for s in [
            "foo",
            "com.example",
            "1com.example.foo",
            "com.example.3foo",
            "com.example.foo-bar",
            "com..foo",
            "com.example.",
            "-com.example.foo",
            "com.example-.foo",
            "com.exa mple.foo",
            "com.example.foo/bar",
            "com.example.foo*",
            "",
        ] {
            assert!(Nsid::new(s).is_err(), "{s}");
        }
    }

    #[test]
    fn segment_length_boundary() {
        let label = "a".repeat(MAX_SEGMENT_LEN);
        assert!(Nsid::new_owned(format!("com.{label}.foo")).is_ok());
        assert!(Nsid::new_owned(format!("com.example.{label}")).is_ok());
        assert!(Nsid::new_owned(format!("{label}.example.foo")).is_ok());

        let too_long = "a".repeat(MAX_SEGMENT_LEN + 1);
        let err = Nsid::new_owned(format!("com.{too_long}.foo")).unwrap_err();
        match err.kind {
            StrParseKind::RegexFail {
                span: Some(span), ..
            } => {
                assert_eq!(span.offset(), 4);
                assert_eq!(span.len(), 64);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn total_length_boundary() {
        let seg = "a".repeat(63);
        // 253-char authority: four 63-char segments minus one char, then the name
        let authority = format!("{seg}.{seg}.{seg}.{}", "a".repeat(61));
        assert_eq!(authority.len(), 253);
        let max = format!("{authority}.{seg}");
        assert_eq!(max.len(), MAX_NSID_LEN);
        assert!(Nsid::new(&max).is_ok());

        let over = format!("{authority}a.{seg}");
        let err = Nsid::new(&over).unwrap_err();
        assert!(matches!(err.kind, StrParseKind::TooLong { max: 317, .. }));
    }

    #[test]
    fn first_failing_check_is_reported() {
        let err = Nsid::new("foo").unwrap_err();
        assert!(matches!(err.kind, StrParseKind::MissingComponent { .. }));

        let err = Nsid::new("1com.example.foo").unwrap_err();
        assert!(err.to_string().contains("digit"), "{err}");

        let err = Nsid::new("com.example.foo-bar").unwrap_err();
        match err.kind {
            StrParseKind::Disallowed {
                problem: Some(span),
                ..
            } => assert_eq!(span.offset(), 15),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn authority_and_name() {
        let nsid = Nsid::new("app.bsky.feed.post").unwrap();
        assert_eq!(nsid.domain_authority(), "app.bsky.feed");
        assert_eq!(nsid.name(), "post");
        assert_eq!(
            nsid.segments().collect::<Vec<_>>(),
            ["app", "bsky", "feed", "post"]
        );
    }
}

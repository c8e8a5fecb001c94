use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;
use std::{ops::Deref, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::SmolStr;

use crate::types::string::AtStrError;
use crate::{CowStr, IntoStatic};
use regex::Regex;

/// AT Protocol handle: a DNS hostname used as a human-readable account name.
///
/// Comparison and hashing are ASCII case-insensitive; the original casing is kept
/// for display. Use [`Handle::normalized`] for the canonical lower-case form.
///
/// See <https://atproto.com/specs/handle>.
#[derive(Clone, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Handle<'h>(CowStr<'h>);

/// Maximum length of a handle, in bytes.
pub const MAX_HANDLE_LEN: usize = 253;

/// Maximum length of a single label, in bytes.
pub const MAX_LABEL_LEN: usize = 63;

/// Handle syntax: two or more dot-separated labels, the last starting with a letter.
pub static HANDLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$").unwrap()
});

/// Top-level domains that are syntactically fine but must not be used for real accounts.
pub const DISALLOWED_TLDS: &[&str] = &[
    ".local",
    ".arpa",
    ".invalid",
    ".localhost",
    ".internal",
    ".example",
    ".alt",
    // policy could concievably change on ".onion" some day
    ".onion",
    // NOTE: .test is allowed in testing and development. In practical terms
    // it "should" "never" actually resolve and get registered in production
];

pub(crate) fn validate(handle: &str) -> Result<(), AtStrError> {
    if handle.is_empty() {
        return Err(AtStrError::too_short("handle", handle, 1, 0));
    }
    if handle.len() > MAX_HANDLE_LEN {
        return Err(AtStrError::too_long(
            "handle",
            handle,
            MAX_HANDLE_LEN,
            handle.len(),
        ));
    }
    let mut start = 0;
    let mut labels = 0;
    let mut last = "";
    for label in handle.split('.') {
        let span = (start, label.len());
        if label.is_empty() {
            return Err(AtStrError::missing_from("handle", handle, "label", span));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(AtStrError::invalid_at(
                "handle",
                handle,
                span,
                "labels are at most 63 characters",
            ));
        }
        if let Some((i, c)) = label
            .char_indices()
            .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '-'))
        {
            return Err(AtStrError::bad_char("handle", handle, start + i, c));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(AtStrError::invalid_at(
                "handle",
                handle,
                span,
                "labels can't start or end with `-`",
            ));
        }
        start += label.len() + 1;
        labels += 1;
        last = label;
    }
    if labels < 2 {
        return Err(AtStrError::missing_from(
            "handle",
            handle,
            "at least two labels",
            (handle.len(), 0),
        ));
    }
    if !last.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(AtStrError::invalid_at(
            "handle",
            handle,
            (handle.len() - last.len(), last.len()),
            "top-level domain must start with a letter",
        ));
    }
    if !HANDLE_REGEX.is_match(handle) {
        return Err(AtStrError::regex(
            "handle",
            handle,
            SmolStr::new_static("invalid"),
        ));
    }
    Ok(())
}

impl<'h> Handle<'h> {
    /// Placeholder handle for accounts whose handle failed verification.
    pub const INVALID: &'static str = "handle.invalid";

    /// Fallible constructor, validates, borrows from input
    pub fn new(handle: &'h str) -> Result<Self, AtStrError> {
        validate(handle)?;
        Ok(Self(CowStr::Borrowed(handle)))
    }

    /// Fallible constructor, validates, takes ownership
    pub fn new_owned(handle: impl AsRef<str>) -> Result<Handle<'static>, AtStrError> {
        let handle = handle.as_ref();
        validate(handle)?;
        Ok(Handle(CowStr::copy_from_str(handle)))
    }

    /// Fallible constructor, validates, doesn't allocate
    pub fn new_static(handle: &'static str) -> Result<Handle<'static>, AtStrError> {
        validate(handle)?;
        Ok(Handle(CowStr::new_static(handle)))
    }

    /// Fallible constructor from an existing CowStr
    pub fn from_cowstr(handle: CowStr<'h>) -> Result<Self, AtStrError> {
        validate(&handle)?;
        Ok(Self(handle))
    }

    /// Infallible constructor for when you *know* the string is a valid handle.
    ///
    /// # Panics
    ///
    /// Panics with the validation error if `handle` is not a valid handle.
    pub fn raw(handle: &'h str) -> Self {
        match validate(handle) {
            Ok(()) => Self(CowStr::Borrowed(handle)),
            Err(e) => panic!("invalid handle: {e}"),
        }
    }

    /// Infallible constructor for when you *know* the string is a valid handle.
    ///
    /// # Safety
    ///
    /// The caller upholds the handle grammar; nothing is checked.
    pub unsafe fn unchecked(handle: &'h str) -> Self {
        Self(CowStr::Borrowed(handle))
    }

    /// Returns the handle as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Lower-cased form, borrowed when already lower case.
    pub fn normalized(&self) -> CowStr<'_> {
        if self.0.bytes().any(|b| b.is_ascii_uppercase()) {
            CowStr::Owned(self.0.to_ascii_lowercase().into())
        } else {
            CowStr::Borrowed(self.0.as_str())
        }
    }

    /// The top-level domain, without the leading dot.
    pub fn tld(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or_default()
    }

    /// Whether this handle ends in a TLD that is reserved or non-resolvable.
    pub fn has_disallowed_tld(&self) -> bool {
        let lower = self.normalized();
        DISALLOWED_TLDS.iter().any(|tld| lower.ends_with(tld))
    }

    /// Whether this is the `handle.invalid` placeholder.
    pub fn is_invalid_placeholder(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::INVALID)
    }
}

impl PartialEq for Handle<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Handle<'_> {}

impl Hash for Handle<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl PartialOrd for Handle<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Handle<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.0.bytes().map(|b| b.to_ascii_lowercase());
        let rhs = other.0.bytes().map(|b| b.to_ascii_lowercase());
        lhs.cmp(rhs)
    }
}

impl FromStr for Handle<'_> {
    type Err = AtStrError;

    /// Has to take ownership due to the lifetime constraints of the FromStr trait.
    /// Prefer `Handle::new()` if you want to borrow.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Handle::new_owned(s)
    }
}

impl TryFrom<String> for Handle<'static> {
    type Error = AtStrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Handle::new_owned(value)
    }
}

impl IntoStatic for Handle<'_> {
    type Output = Handle<'static>;

    fn into_static(self) -> Self::Output {
        Handle(self.0.into_static())
    }
}

impl<'de, 'a> Deserialize<'de> for Handle<'a>
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

impl fmt::Display for Handle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Handle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl<'h> From<Handle<'h>> for String {
    fn from(value: Handle<'h>) -> Self {
        value.0.to_string()
    }
}

impl<'h> From<Handle<'h>> for CowStr<'h> {
    fn from(value: Handle<'h>) -> Self {
        value.0
    }
}

impl AsRef<str> for Handle<'_> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Handle<'_> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

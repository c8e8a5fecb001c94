use crate::types::string::AtStrError;
use crate::{CowStr, IntoStatic};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::ToSmolStr;
use std::fmt;
use std::sync::LazyLock;
use std::{ops::Deref, str::FromStr};

/// Decentralized Identifier: `did:<method>:<method-specific-id>`.
///
/// See <https://atproto.com/specs/did>.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Hash)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Did<'d>(CowStr<'d>);

/// Maximum length of a DID, in bytes.
pub const MAX_DID_LEN: usize = 2048;

/// Full-grammar DID regex, applied after the character scan.
///
/// `%` is allowed inside the identifier but not at the end; well-formedness of
/// percent-escapes is not checked.
pub static DID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^did:[a-z0-9]+:[a-zA-Z0-9._:%-]*[a-zA-Z0-9._-]$").unwrap());

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '%' | '-')
}

/// Shared validation for every `Did` constructor.
pub(crate) fn validate(did: &str) -> Result<(), AtStrError> {
    if did.len() > MAX_DID_LEN {
        return Err(AtStrError::too_long("did", did, MAX_DID_LEN, did.len()));
    }
    let Some(rest) = did.strip_prefix("did:") else {
        return Err(match did.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("did:") => {
                AtStrError::invalid_at("did", did, (0, 4), "scheme must be lowercase `did:`")
            }
            _ => AtStrError::missing_from("did", did, "`did:` prefix", (0, 0)),
        });
    };
    let Some(colon) = rest.find(':') else {
        return Err(AtStrError::missing_from(
            "did",
            did,
            "`:` after method name",
            (did.len(), 0),
        ));
    };
    if colon == 0 {
        return Err(AtStrError::missing_from("did", did, "method name", (4, 0)));
    }
    for (i, c) in rest[..colon].char_indices() {
        if !(c.is_ascii_lowercase() || c.is_ascii_digit()) {
            return Err(AtStrError::bad_char("did", did, 4 + i, c));
        }
    }
    let id_start = 4 + colon + 1;
    let id = &did[id_start..];
    if id.is_empty() {
        return Err(AtStrError::missing_from(
            "did",
            did,
            "method-specific identifier",
            (did.len(), 0),
        ));
    }
    if let Some((i, c)) = id.char_indices().find(|&(_, c)| !is_id_char(c)) {
        return Err(AtStrError::bad_char("did", did, id_start + i, c));
    }
    if id.ends_with(':') || id.ends_with('%') {
        return Err(AtStrError::invalid_at(
            "did",
            did,
            (did.len() - 1, 1),
            "must not end with `:` or `%`",
        ));
    }
    if !DID_REGEX.is_match(did) {
        return Err(AtStrError::regex("did", did, "invalid".to_smolstr()));
    }
    Ok(())
}

impl<'d> Did<'d> {
    /// Fallible constructor, validates, borrows from input
    pub fn new(did: &'d str) -> Result<Self, AtStrError> {
        validate(did)?;
        Ok(Self(CowStr::Borrowed(did)))
    }

    /// Fallible constructor, validates, takes ownership
    pub fn new_owned(did: impl AsRef<str>) -> Result<Did<'static>, AtStrError> {
        let did = did.as_ref();
        validate(did)?;
        Ok(Did(CowStr::copy_from_str(did)))
    }

    /// Fallible constructor, validates, doesn't allocate
    pub fn new_static(did: &'static str) -> Result<Did<'static>, AtStrError> {
        validate(did)?;
        Ok(Did(CowStr::new_static(did)))
    }

    /// Fallible constructor from an existing CowStr, keeps whatever it borrows
    pub fn from_cowstr(did: CowStr<'d>) -> Result<Self, AtStrError> {
        validate(&did)?;
        Ok(Self(did))
    }

    /// Infallible constructor for when you *know* the string is a valid DID.
    ///
    /// # Panics
    ///
    /// Panics with the validation error if `did` is not a valid DID.
    pub fn raw(did: &'d str) -> Self {
        match validate(did) {
            Ok(()) => Self(CowStr::Borrowed(did)),
            Err(e) => panic!("invalid DID: {e}"),
        }
    }

    /// Infallible constructor for when you *know* the string is a valid DID.
    ///
    /// # Safety
    ///
    /// The caller upholds the DID grammar; nothing is checked.
    pub unsafe fn unchecked(did: &'d str) -> Self {
        Self(CowStr::Borrowed(did))
    }

    /// Returns the DID as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The DID method, e.g. `plc` for `did:plc:...`.
    pub fn method(&self) -> &str {
        let rest = &self.0[4..];
        match rest.find(':') {
            Some(end) => &rest[..end],
            None => rest,
        }
    }

    /// The method-specific identifier: everything after the second `:`.
    pub fn identifier(&self) -> &str {
        let rest = &self.0[4..];
        match rest.find(':') {
            Some(end) => &rest[end + 1..],
            None => "",
        }
    }
}

impl FromStr for Did<'_> {
    type Err = AtStrError;

    /// Has to take ownership due to the lifetime constraints of the FromStr trait.
    /// Prefer `Did::new()` if you want to borrow.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Did::new_owned(s)
    }
}

impl TryFrom<String> for Did<'static> {
    type Error = AtStrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Did::new_owned(value)
    }
}

impl IntoStatic for Did<'_> {
    type Output = Did<'static>;

    fn into_static(self) -> Self::Output {
        Did(self.0.into_static())
    }
}

impl<'de, 'a> Deserialize<'de> for Did<'a>
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

impl fmt::Display for Did<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Did<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Did").field(&self.as_str()).finish()
    }
}

impl<'d> From<Did<'d>> for String {
    fn from(value: Did<'d>) -> Self {
        value.0.to_string()
    }
}

impl<'d> From<Did<'d>> for CowStr<'d> {
    fn from(value: Did<'d>) -> Self {
        value.0
    }
}

impl AsRef<str> for Did<'_> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Did<'_> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

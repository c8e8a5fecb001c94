use crate::types::handle::Handle;
use crate::types::string::AtStrError;
use crate::{IntoStatic, types::did::Did};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de::Error};

use crate::CowStr;

/// An AT Protocol identifier: either a DID or a handle.
///
/// Parsing tries DID first. Anything with a `did:` prefix that fails DID validation
/// is reported with the DID error, since a handle could never have matched it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Hash)]
#[serde(untagged)]
pub enum AtIdentifier<'i> {
    /// DID
    Did(Did<'i>),
    /// Handle
    Handle(Handle<'i>),
}

impl<'i> AtIdentifier<'i> {
    /// Fallible constructor, validates, borrows from input
    pub fn new(ident: &'i str) -> Result<Self, AtStrError> {
        match Did::new(ident) {
            Ok(did) => Ok(AtIdentifier::Did(did)),
            Err(e) if ident.starts_with("did:") => Err(e),
            Err(_) => Handle::new(ident).map(AtIdentifier::Handle),
        }
    }

    /// Fallible constructor, validates, takes ownership
    pub fn new_owned(ident: impl AsRef<str>) -> Result<AtIdentifier<'static>, AtStrError> {
        AtIdentifier::new(ident.as_ref()).map(IntoStatic::into_static)
    }

    /// Fallible constructor, validates, doesn't allocate
    pub fn new_static(ident: &'static str) -> Result<AtIdentifier<'static>, AtStrError> {
        match Did::new_static(ident) {
            Ok(did) => Ok(AtIdentifier::Did(did)),
            Err(e) if ident.starts_with("did:") => Err(e),
            Err(_) => Handle::new_static(ident).map(AtIdentifier::Handle),
        }
    }

    /// Fallible constructor from an existing CowStr
    pub fn from_cowstr(ident: CowStr<'i>) -> Result<Self, AtStrError> {
        match ident {
            CowStr::Borrowed(s) => AtIdentifier::new(s),
            CowStr::Owned(s) => AtIdentifier::new_owned(s),
        }
    }

    /// Infallible constructor for when you *know* the string is a valid identifier.
    ///
    /// # Panics
    ///
    /// Panics with the validation error if `ident` is neither a DID nor a handle.
    pub fn raw(ident: &'i str) -> Self {
        match AtIdentifier::new(ident) {
            Ok(ident) => ident,
            Err(e) => panic!("invalid at-identifier: {e}"),
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            AtIdentifier::Did(did) => did.as_str(),
            AtIdentifier::Handle(handle) => handle.as_str(),
        }
    }

    /// The DID, if this is one.
    pub fn as_did(&self) -> Option<&Did<'i>> {
        match self {
            AtIdentifier::Did(did) => Some(did),
            AtIdentifier::Handle(_) => None,
        }
    }

    /// The handle, if this is one.
    pub fn as_handle(&self) -> Option<&Handle<'i>> {
        match self {
            AtIdentifier::Did(_) => None,
            AtIdentifier::Handle(handle) => Some(handle),
        }
    }
}

impl<'i> From<Did<'i>> for AtIdentifier<'i> {
    fn from(did: Did<'i>) -> Self {
        AtIdentifier::Did(did)
    }
}

impl<'i> From<Handle<'i>> for AtIdentifier<'i> {
    fn from(handle: Handle<'i>) -> Self {
        AtIdentifier::Handle(handle)
    }
}

impl FromStr for AtIdentifier<'_> {
    type Err = AtStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AtIdentifier::new_owned(s)
    }
}

impl TryFrom<String> for AtIdentifier<'static> {
    type Error = AtStrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AtIdentifier::new_owned(value)
    }
}

impl IntoStatic for AtIdentifier<'_> {
    type Output = AtIdentifier<'static>;

    fn into_static(self) -> Self::Output {
        match self {
            AtIdentifier::Did(did) => AtIdentifier::Did(did.into_static()),
            AtIdentifier::Handle(handle) => AtIdentifier::Handle(handle.into_static()),
        }
    }
}

impl<'de, 'a> Deserialize<'de> for AtIdentifier<'a>
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

impl fmt::Display for AtIdentifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtIdentifier::Did(did) => did.fmt(f),
            AtIdentifier::Handle(handle) => handle.fmt(f),
        }
    }
}

impl<'i> From<AtIdentifier<'i>> for String {
    fn from(value: AtIdentifier) -> Self {
        match value {
            AtIdentifier::Did(did) => did.into(),
            AtIdentifier::Handle(handle) => handle.into(),
        }
    }
}

impl AsRef<str> for AtIdentifier<'_> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn did_first() {
        let ident = AtIdentifier::new("did:web:example.com").unwrap();
        assert!(matches!(ident, AtIdentifier::Did(_)));
        assert_eq!(ident.as_did().map(|d| d.method()), Some("web"));
    }

    #[test]
    fn falls_back_to_handle() {
        let ident = AtIdentifier::new("alice.bsky.social").unwrap();
        assert!(matches!(ident, AtIdentifier::Handle(_)));
        assert!(ident.as_did().is_none());
    }

    #[test]
    fn did_prefixed_input_keeps_did_error() {
        let err = AtIdentifier::new("did:web:").unwrap_err();
        assert_eq!(err.spec, "did");
    }

    #[test]
    fn neither() {
        let err = AtIdentifier::new("not an identifier").unwrap_err();
        assert_eq!(err.spec, "handle");
    }

    #[test]
    fn serde_picks_variant() {
        let ids: Vec<AtIdentifier> =
            serde_json::from_str(r#"["did:plc:abc123", "bob.test"]"#).unwrap();
        assert!(matches!(ids[0], AtIdentifier::Did(_)));
        assert!(matches!(ids[1], AtIdentifier::Handle(_)));
        assert_eq!(
            serde_json::to_string(&ids).unwrap(),
            r#"["did:plc:abc123","bob.test"]"#
        );
    }
}

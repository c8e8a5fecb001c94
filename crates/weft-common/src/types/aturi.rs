use crate::types::ident::AtIdentifier;
use crate::types::nsid::Nsid;
use crate::types::recordkey::{RecordKey, Rkey};
use crate::types::string::AtStrError;
use crate::{CowStr, IntoStatic};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};
use smol_str::SmolStr;
use std::fmt::{self, Write};
use std::hash::{Hash, Hasher};
use std::{ops::Deref, str::FromStr};

/// Maximum length of an AT URI, in bytes.
pub const MAX_AT_URI_LEN: usize = 8192;

const SCHEME: &str = "at://";

/// An [AT URI]: `at://<authority>[/<collection>[/<rkey>]][?<query>][#<fragment>]`.
///
/// Each path segment is parsed by its own type, so a record key can only exist
/// beneath a collection. The original string is kept verbatim; `to_string()` gives
/// back exactly what was parsed.
///
/// [AT URI]: https://atproto.com/specs/at-uri-scheme
#[derive(Clone, Debug)]
pub struct AtUri<'u> {
    uri: CowStr<'u>,
    authority: AtIdentifier<'u>,
    path: Option<UriPath<'u>>,
    query: Option<CowStr<'u>>,
    fragment: Option<CowStr<'u>>,
}

/// The repo path of an AT URI: a collection and, optionally, a record within it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UriPath<'u> {
    /// The collection NSID
    pub collection: Nsid<'u>,
    /// The record key, if the URI points at a single record
    pub rkey: Option<RecordKey<Rkey<'u>>>,
}

impl IntoStatic for UriPath<'_> {
    type Output = UriPath<'static>;

    fn into_static(self) -> Self::Output {
        UriPath {
            collection: self.collection.into_static(),
            rkey: self.rkey.into_static(),
        }
    }
}

impl fmt::Display for UriPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection.as_str())?;
        if let Some(rkey) = &self.rkey {
            write!(f, "/{rkey}")?;
        }
        Ok(())
    }
}

/// Query and fragment text: anything printable that isn't a space.
fn check_suffix(uri: &str, offset: usize, part: &str, what: &str) -> Result<(), AtStrError> {
    if part.is_empty() {
        return Err(AtStrError::missing_from(
            "at-uri-scheme",
            uri,
            what,
            (offset, 0),
        ));
    }
    match part
        .char_indices()
        .find(|&(_, c)| c.is_whitespace() || c.is_control())
    {
        Some((i, c)) => Err(AtStrError::bad_char("at-uri-scheme", uri, offset + i, c)),
        None => Ok(()),
    }
}

struct Parsed<'u> {
    authority: AtIdentifier<'u>,
    path: Option<UriPath<'u>>,
    query: Option<&'u str>,
    fragment: Option<&'u str>,
}

fn parse(uri: &str) -> Result<Parsed<'_>, AtStrError> {
    if uri.len() > MAX_AT_URI_LEN {
        return Err(AtStrError::too_long(
            "at-uri-scheme",
            uri,
            MAX_AT_URI_LEN,
            uri.len(),
        ));
    }
    let Some(rest) = uri.strip_prefix(SCHEME) else {
        return Err(AtStrError::missing_from(
            "at-uri-scheme",
            uri,
            "`at://` scheme",
            (0, 0),
        ));
    };

    // the fragment goes first: `?` is allowed inside it
    let (rest, fragment) = match rest.split_once('#') {
        Some((rest, fragment)) => {
            check_suffix(uri, SCHEME.len() + rest.len() + 1, fragment, "fragment")?;
            (rest, Some(fragment))
        }
        None => (rest, None),
    };
    let (rest, query) = match rest.split_once('?') {
        Some((rest, query)) => {
            check_suffix(uri, SCHEME.len() + rest.len() + 1, query, "query")?;
            (rest, Some(query))
        }
        None => (rest, None),
    };

    let mut segments = rest.split('/');
    let mut offset = SCHEME.len();
    let authority = segments.next().unwrap_or_default();
    if authority.is_empty() {
        return Err(AtStrError::missing_from(
            "at-uri-scheme",
            uri,
            "authority",
            (offset, 0),
        ));
    }
    let authority = AtIdentifier::new(authority)
        .map_err(|e| AtStrError::wrap("at-uri-scheme", uri, offset, e))?;
    offset += authority.as_str().len() + 1;

    let path = match segments.next() {
        None => None,
        Some("") => {
            return Err(AtStrError::invalid_at(
                "at-uri-scheme",
                uri,
                (offset - 1, 1),
                "trailing `/` without a collection",
            ));
        }
        Some(collection) => {
            let collection = Nsid::new(collection)
                .map_err(|e| AtStrError::wrap("at-uri-scheme", uri, offset, e))?;
            offset += collection.as_str().len() + 1;
            let rkey = match segments.next() {
                None => None,
                Some("") => {
                    return Err(AtStrError::invalid_at(
                        "at-uri-scheme",
                        uri,
                        (offset - 1, 1),
                        "trailing `/` without a record key",
                    ));
                }
                Some(rkey) => {
                    let rkey = Rkey::new(rkey)
                        .map_err(|e| AtStrError::wrap("at-uri-scheme", uri, offset, e))?;
                    offset += rkey.as_str().len() + 1;
                    Some(RecordKey(rkey))
                }
            };
            Some(UriPath { collection, rkey })
        }
    };

    if segments.next().is_some() {
        let end = SCHEME.len() + rest.len();
        return Err(AtStrError::invalid_at(
            "at-uri-scheme",
            uri,
            (offset, end.saturating_sub(offset)),
            "too many path segments",
        ));
    }

    Ok(Parsed {
        authority,
        path,
        query,
        fragment,
    })
}

impl<'u> AtUri<'u> {
    /// Fallible constructor, validates, borrows from input
    pub fn new(uri: &'u str) -> Result<Self, AtStrError> {
        let parsed = parse(uri)?;
        Ok(Self {
            uri: CowStr::Borrowed(uri),
            authority: parsed.authority,
            path: parsed.path,
            query: parsed.query.map(CowStr::Borrowed),
            fragment: parsed.fragment.map(CowStr::Borrowed),
        })
    }

    /// Fallible constructor, validates, takes ownership
    pub fn new_owned(uri: impl AsRef<str>) -> Result<AtUri<'static>, AtStrError> {
        AtUri::new(uri.as_ref()).map(IntoStatic::into_static)
    }

    /// Fallible constructor from an existing CowStr
    pub fn from_cowstr(uri: CowStr<'u>) -> Result<Self, AtStrError> {
        match uri {
            CowStr::Borrowed(s) => AtUri::new(s),
            CowStr::Owned(s) => AtUri::new_owned(s),
        }
    }

    /// Infallible constructor for when you *know* the string is a valid AT URI.
    ///
    /// # Panics
    ///
    /// Panics with the validation error if `uri` is not a valid AT URI.
    pub fn raw(uri: &'u str) -> Self {
        match AtUri::new(uri) {
            Ok(uri) => uri,
            Err(e) => panic!("invalid AT URI: {e}"),
        }
    }

    /// Build a URI from already validated parts.
    pub fn from_parts(authority: AtIdentifier<'u>, path: Option<UriPath<'u>>) -> Self {
        let mut uri = String::with_capacity(SCHEME.len() + authority.as_str().len() + 64);
        uri.push_str(SCHEME);
        uri.push_str(authority.as_str());
        if let Some(path) = &path {
            // writing to a String can't fail
            let _ = write!(uri, "/{path}");
        }
        Self {
            uri: CowStr::Owned(SmolStr::new(uri)),
            authority,
            path,
            query: None,
            fragment: None,
        }
    }

    /// The repo the URI points into, a DID or a handle.
    pub fn authority(&self) -> &AtIdentifier<'u> {
        &self.authority
    }

    /// Collection and record key, if present.
    pub fn path(&self) -> Option<&UriPath<'u>> {
        self.path.as_ref()
    }

    /// Collection NSID, if the URI has a path.
    pub fn collection(&self) -> Option<&Nsid<'u>> {
        self.path.as_ref().map(|p| &p.collection)
    }

    /// Record key, if the path has one.
    pub fn rkey(&self) -> Option<&RecordKey<Rkey<'u>>> {
        self.path.as_ref().and_then(|p| p.rkey.as_ref())
    }

    /// Query, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Fragment, without the leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// The whole URI as given.
    pub fn as_str(&self) -> &str {
        self.uri.as_str()
    }
}

impl PartialEq for AtUri<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for AtUri<'_> {}

impl Hash for AtUri<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

impl FromStr for AtUri<'_> {
    type Err = AtStrError;

    /// Has to take ownership due to the lifetime constraints of the FromStr trait.
    /// Prefer `AtUri::new()` if you want to borrow.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AtUri::new_owned(s)
    }
}

impl TryFrom<String> for AtUri<'static> {
    type Error = AtStrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AtUri::new_owned(value)
    }
}

impl IntoStatic for AtUri<'_> {
    type Output = AtUri<'static>;

    fn into_static(self) -> Self::Output {
        AtUri {
            uri: self.uri.into_static(),
            authority: self.authority.into_static(),
            path: self.path.into_static(),
            query: self.query.into_static(),
            fragment: self.fragment.into_static(),
        }
    }
}

impl Serialize for AtUri<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de, 'a> Deserialize<'de> for AtUri<'a>
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

impl fmt::Display for AtUri<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl<'u> From<AtUri<'u>> for String {
    fn from(value: AtUri<'u>) -> Self {
        value.uri.to_string()
    }
}

impl<'u> From<AtUri<'u>> for CowStr<'u> {
    fn from(value: AtUri<'u>) -> Self {
        value.uri
    }
}

impl AsRef<str> for AtUri<'_> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for AtUri<'_> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

use miette::SourceSpan;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::{SmolStr, ToSmolStr};
use std::sync::Arc;

use crate::IntoStatic;
pub use crate::{
    CowStr,
    types::{
        aturi::{AtUri, UriPath},
        cid::{Cid, CidLink},
        did::Did,
        handle::Handle,
        ident::AtIdentifier,
        nsid::Nsid,
        recordkey::{RecordKey, Rkey},
        tid::Tid,
    },
};

/// ATProto string value, classified into the most specific identifier type it parses as.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AtprotoStr<'s> {
    /// Canonical (lower-case) timestamp identifier
    Tid(Tid),
    /// Decentralized identifier
    Did(Did<'s>),
    /// Handle; NSIDs land here too, since every NSID is also a valid handle
    Handle(Handle<'s>),
    /// Namespaced identifier that isn't a valid handle
    Nsid(Nsid<'s>),
    /// `at://` URI
    AtUri(AtUri<'s>),
    /// Content identifier
    Cid(Cid),
    /// Anything else
    String(CowStr<'s>),
}

impl<'s> AtprotoStr<'s> {
    /// Borrowing constructor for bare atproto string values.
    ///
    /// Tries each identifier type from most to least specific, which makes this
    /// comparatively slow; prefer the concrete constructors when the field type is known.
    ///
    /// Record keys are never produced here: almost any short token is a valid record
    /// key, so it would swallow ordinary strings.
    pub fn new(string: &'s str) -> Self {
        // TIDs parse case-insensitively, but only the canonical form is classified as one
        if let Some(tid) = Tid::new(string).ok().filter(|tid| tid.as_str() == string) {
            Self::Tid(tid)
        } else if let Ok(did) = Did::new(string) {
            Self::Did(did)
        } else if string.starts_with("at://") {
            match AtUri::new(string) {
                Ok(uri) => Self::AtUri(uri),
                Err(_) => Self::String(CowStr::Borrowed(string)),
            }
        } else if let Ok(handle) = Handle::new(string) {
            // NSIDs are also valid handles; a final segment that's all letters is the
            // typical NSID name, but there's no way to tell them apart in general.
            Self::Handle(handle)
        } else if let Ok(nsid) = Nsid::new(string) {
            Self::Nsid(nsid)
        } else if let Ok(cid) = Cid::new(string) {
            Self::Cid(cid)
        } else {
            Self::String(CowStr::Borrowed(string))
        }
    }

    /// The string as it was given.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tid(tid) => tid.as_str(),
            Self::Did(did) => did.as_str(),
            Self::Handle(handle) => handle.as_str(),
            Self::Nsid(nsid) => nsid.as_str(),
            Self::AtUri(uri) => uri.as_str(),
            Self::Cid(cid) => cid.as_str(),
            Self::String(string) => string.as_str(),
        }
    }
}

impl AsRef<str> for AtprotoStr<'_> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for AtprotoStr<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de, 'a> Deserialize<'de> for AtprotoStr<'a>
where
    'de: 'a,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: CowStr<'a> = Deserialize::deserialize(deserializer)?;
        Ok(match value {
            CowStr::Borrowed(s) => Self::new(s),
            CowStr::Owned(s) => AtprotoStr::new(s.as_str()).into_static(),
        })
    }
}

impl IntoStatic for AtprotoStr<'_> {
    type Output = AtprotoStr<'static>;

    fn into_static(self) -> Self::Output {
        match self {
            AtprotoStr::Tid(tid) => AtprotoStr::Tid(tid),
            AtprotoStr::Did(did) => AtprotoStr::Did(did.into_static()),
            AtprotoStr::Handle(handle) => AtprotoStr::Handle(handle.into_static()),
            AtprotoStr::Nsid(nsid) => AtprotoStr::Nsid(nsid.into_static()),
            AtprotoStr::AtUri(uri) => AtprotoStr::AtUri(uri.into_static()),
            AtprotoStr::Cid(cid) => AtprotoStr::Cid(cid),
            AtprotoStr::String(s) => AtprotoStr::String(s.into_static()),
        }
    }
}

/// Parsing error for atproto string types.
///
/// `spec` is the final url path segment on atproto.com/specs describing the type,
/// `source` is the offending input, verbatim, and `kind` says what was wrong with it.
#[derive(Debug, Clone, thiserror::Error, miette::Diagnostic)]
#[error("error in `{source}`: {kind}")]
#[diagnostic(url("https://atproto.com/specs/{spec}"))]
pub struct AtStrError {
    /// Docs page for the type, under atproto.com/specs
    pub spec: SmolStr,
    /// The input that failed to parse
    #[source_code]
    pub source: String,
    /// What was wrong with it
    #[source]
    #[diagnostic_source]
    pub kind: StrParseKind,
}

impl AtStrError {
    /// Error of any kind against `source`.
    pub fn new(spec: &'static str, source: impl Into<String>, kind: StrParseKind) -> Self {
        Self {
            spec: SmolStr::new_static(spec),
            source: source.into(),
            kind,
        }
    }

    /// Wrap an error from parsing one component of a larger string.
    ///
    /// `offset` is where the component starts in `source`; spans from the inner error
    /// are shifted by it so they point into the outer string.
    pub fn wrap(spec: &'static str, source: &str, offset: usize, error: AtStrError) -> Self {
        let inner_span = match &error.kind {
            StrParseKind::Disallowed { problem, .. } => *problem,
            StrParseKind::MissingComponent { span, .. }
            | StrParseKind::RegexFail { span, .. }
            | StrParseKind::Wrap { span, .. } => *span,
            _ => None,
        };
        let span = inner_span
            .map(|s| SourceSpan::new((s.offset() + offset).into(), s.len()))
            .unwrap_or_else(|| SourceSpan::new(offset.into(), error.source.len()));
        Self::new(
            spec,
            source,
            StrParseKind::Wrap {
                span: Some(span),
                err: Arc::new(error),
            },
        )
    }

    /// something on the provided disallowed list was found in the source string
    pub fn disallowed(spec: &'static str, source: &str, disallowed: &[&str]) -> Self {
        for item in disallowed {
            if let Some(loc) = source.find(item) {
                return Self::new(
                    spec,
                    source,
                    StrParseKind::Disallowed {
                        problem: Some(SourceSpan::new(loc.into(), item.len())),
                        message: smol_str::format_smolstr!("`{item}` is not allowed"),
                    },
                );
            }
        }
        Self::new(
            spec,
            source,
            StrParseKind::Disallowed {
                problem: None,
                message: SmolStr::new_static("disallowed value"),
            },
        )
    }

    /// A single disallowed character at a known position.
    pub fn bad_char(spec: &'static str, source: &str, index: usize, ch: char) -> Self {
        Self::new(
            spec,
            source,
            StrParseKind::Disallowed {
                problem: Some(SourceSpan::new(index.into(), ch.len_utf8())),
                message: smol_str::format_smolstr!("character {ch:?} is not allowed here"),
            },
        )
    }

    /// The whole value is a reserved token.
    pub fn reserved(spec: &'static str, source: &str) -> Self {
        Self::new(
            spec,
            source,
            StrParseKind::Disallowed {
                problem: Some(SourceSpan::new(0.into(), source.len())),
                message: smol_str::format_smolstr!("`{source}` is reserved"),
            },
        )
    }

    /// Input longer than `max`.
    pub fn too_long(spec: &'static str, source: &str, max: usize, actual: usize) -> Self {
        Self::new(spec, source, StrParseKind::TooLong { max, actual })
    }

    /// Input shorter than `min`.
    pub fn too_short(spec: &'static str, source: &str, min: usize, actual: usize) -> Self {
        Self::new(spec, source, StrParseKind::TooShort { min, actual })
    }

    /// missing component, with the span where it was expected to be found
    pub fn missing_from(
        spec: &'static str,
        source: &str,
        expected: &str,
        span: (usize, usize),
    ) -> Self {
        Self::new(
            spec,
            source,
            StrParseKind::MissingComponent {
                span: Some(span.into()),
                message: SmolStr::new(expected),
            },
        )
    }

    /// The whole input failed the type's grammar.
    pub fn regex(spec: &'static str, source: &str, message: SmolStr) -> Self {
        Self::new(
            spec,
            source,
            StrParseKind::RegexFail {
                span: None,
                message,
            },
        )
    }

    /// A grammar violation at a known span.
    pub fn invalid_at(
        spec: &'static str,
        source: &str,
        span: (usize, usize),
        message: impl ToSmolStr,
    ) -> Self {
        Self::new(
            spec,
            source,
            StrParseKind::RegexFail {
                span: Some(span.into()),
                message: message.to_smolstr(),
            },
        )
    }
}

/// What went wrong parsing an atproto string
#[derive(Debug, Clone, thiserror::Error, miette::Diagnostic)]
pub enum StrParseKind {
    /// Input doesn't follow the type's grammar
    #[error("invalid - {message}")]
    #[diagnostic(code(weft::types::string::invalid))]
    RegexFail {
        /// Where, if known
        #[label]
        span: Option<SourceSpan>,
        /// What the grammar expected
        #[help]
        message: SmolStr,
    },
    /// Input is over the length limit
    #[error("string too long (allowed: {max}, actual: {actual})")]
    #[diagnostic(code(weft::types::string::wrong_length))]
    TooLong {
        /// Limit
        max: usize,
        /// Length of the input
        actual: usize,
    },

    /// Input is under the minimum length
    #[error("string too short (allowed: {min}, actual: {actual})")]
    #[diagnostic(code(weft::types::string::wrong_length))]
    TooShort {
        /// Minimum
        min: usize,
        /// Length of the input
        actual: usize,
    },
    /// Input contains a disallowed character or value
    #[error("disallowed - {message}")]
    #[diagnostic(code(weft::types::string::disallowed))]
    Disallowed {
        /// The offending part, if known
        #[label]
        problem: Option<SourceSpan>,
        /// What was disallowed
        #[help]
        message: SmolStr,
    },
    /// A required component is absent
    #[error("missing - {message}")]
    #[diagnostic(code(weft::atstr::missing_component))]
    MissingComponent {
        /// Where it was expected
        #[label]
        span: Option<SourceSpan>,
        /// Which component
        #[help]
        message: SmolStr,
    },
    /// A component of a composite string failed to parse
    #[error("{err}")]
    #[diagnostic(code(weft::atstr::inner))]
    Wrap {
        /// The component's position in the outer string
        #[label]
        span: Option<SourceSpan>,
        /// The component's own error
        #[source]
        err: Arc<AtStrError>,
    },
}

impl StrParseKind {
    /// Whether this error is about the input's length rather than its content.
    pub fn is_length(&self) -> bool {
        matches!(self, Self::TooLong { .. } | Self::TooShort { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_bare_strings() {
        assert!(matches!(
            AtprotoStr::new("3jzfcijpj2z2a"),
            AtprotoStr::Tid(_)
        ));
        assert!(matches!(
            AtprotoStr::new("did:plc:7iza6de2dwap2sbkpav7c6c6"),
            AtprotoStr::Did(_)
        ));
        assert!(matches!(
            AtprotoStr::new("alice.bsky.social"),
            AtprotoStr::Handle(_)
        ));
        assert!(matches!(
            AtprotoStr::new("at://alice.bsky.social/app.bsky.feed.post"),
            AtprotoStr::AtUri(_)
        ));
        assert!(matches!(
            AtprotoStr::new("bafyreievgu2ty7qbiaaom5zhmkznsnajuzideek3lo7e65dwqlrvrxnmo4"),
            AtprotoStr::Cid(_)
        ));
        assert!(matches!(
            AtprotoStr::new("hello world"),
            AtprotoStr::String(_)
        ));
    }

    #[test]
    fn wrap_shifts_spans() {
        let inner = AtStrError::bad_char("record-key", "a/b", 1, '/');
        let outer = AtStrError::wrap("at-uri-scheme", "at://x.com/a.b.c/a/b", 17, inner);
        match outer.kind {
            StrParseKind::Wrap { span: Some(span), .. } => {
                assert_eq!(span.offset(), 18);
                assert_eq!(span.len(), 1);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn message_names_the_input() {
        let err = AtStrError::too_long("nsid", "com.example.x", 5, 13);
        let msg = err.to_string();
        assert!(msg.contains("com.example.x"), "{msg}");
        assert!(msg.contains("allowed: 5"), "{msg}");
    }

    #[test]
    fn renders_as_a_report() {
        let err = Rkey::new("a/b").unwrap_err();
        let mut out = String::new();
        miette::GraphicalReportHandler::new_themed(miette::GraphicalTheme::unicode_nocolor())
            .with_links(false)
            .render_report(&mut out, &err)
            .unwrap();
        assert!(out.contains("error in `a/b`"), "{out}");
        assert!(out.contains("not allowed here"), "{out}");
    }
}

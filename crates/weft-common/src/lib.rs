//! Identifier and content-addressing primitives for the AT Protocol.
//!
//! Every type here is an immutable, validated value: DIDs, handles, NSIDs, record
//! keys, TIDs, AT URIs and CIDs. Parsing borrows from the input where it can; call
//! [`IntoStatic::into_static`] to detach a value from the buffer it was parsed from.
//!
//! ```
//! use weft_common::types::string::{AtUri, Did, Nsid};
//!
//! let uri = AtUri::new("at://did:plc:7iza6de2dwap2sbkpav7c6c6/app.bsky.feed.post/3jzfcijpj2z2a")?;
//! assert_eq!(uri.collection(), Some(&Nsid::new_static("app.bsky.feed.post")?));
//! assert_eq!(uri.authority().as_str(), "did:plc:7iza6de2dwap2sbkpav7c6c6");
//! # Ok::<(), weft_common::types::string::AtStrError>(())
//! ```

#![warn(missing_docs)]
pub use cowstr::CowStr;
pub use into_static::IntoStatic;
pub use smol_str;

/// A copy-on-write immutable string type that uses [`smol_str::SmolStr`] for
/// the "owned" variant.
pub mod cowstr;
/// Trait for taking ownership of borrowed identifier types.
pub mod into_static;
/// Low-level byte and text codecs used by the identifier types.
pub mod codec;
/// Baseline fundamental AT Protocol identifier types.
pub mod types;

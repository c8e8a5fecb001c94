//! AT Protocol identifier types.
//!
//! Each string type validates eagerly on construction and is immutable afterwards.
//! The string forms are re-exported together from [`string`].

/// `at://` URIs
pub mod aturi;
/// Content identifiers and `$link` wrappers
pub mod cid;
/// Record collections keyed by NSID
pub mod collection;
/// Decentralized identifiers
pub mod did;
/// Domain-name handles
pub mod handle;
/// DID-or-handle identifiers
pub mod ident;
/// Namespaced identifiers
pub mod nsid;
/// Record keys
pub mod recordkey;
/// Shared string error types and the string classifier
pub mod string;
/// Timestamp identifiers and their generator
pub mod tid;

/// Trait for a constant string literal type
pub trait Literal: Clone + Copy + PartialEq + Eq + Send + Sync + 'static {
    /// The string literal
    const LITERAL: &'static str;
}

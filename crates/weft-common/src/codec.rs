//! Low-level codecs shared by the identifier types.
//!
//! - [`varint`]: unsigned LEB128, as used for multicodec prefixes inside CIDs
//! - [`s32`]: the sortable base32 alphabet used by TIDs
//! - [`multibase`]: self-describing base prefixes for CID strings

pub mod multibase;
pub mod s32;
pub mod varint;

use crate::IntoStatic;
use crate::codec::multibase::{self, Base, MultibaseError};
use crate::codec::varint::{self, VarintError};
use bytes::Bytes;
use multihash::Multihash;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::{ops::Deref, str::FromStr};

#[cfg(feature = "ipld")]
pub use cid::Cid as IpldCid;

/// dag-pb, the only codec a v0 CID can carry
pub const DAG_PB_CODEC: u64 = 0x70;

/// dag-cbor, used for atproto records
pub const DAG_CBOR_CODEC: u64 = 0x71;

/// raw, used for blobs
pub const RAW_CODEC: u64 = 0x55;

/// SHA-256
pub const SHA2_256: u64 = 0x12;

/// base 32
pub const ATP_CID_BASE: Base = Base::Base32Lower;

/// Length of a v0 CID string: base58btc of a 34-byte SHA-256 multihash.
const V0_STR_LEN: usize = 46;

/// Length of a SHA-256 multihash: code, length and 32 digest bytes.
const V0_HASH_LEN: usize = 34;

/// CID version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CidVersion {
    /// Legacy: a bare SHA-256 multihash, implicitly dag-pb, written in base58btc
    V0,
    /// `[version][codec][multihash]`, written with a multibase prefix
    V1,
}

impl CidVersion {
    /// The version number as it appears in the binary form.
    pub fn as_u64(self) -> u64 {
        match self {
            CidVersion::V0 => 0,
            CidVersion::V1 => 1,
        }
    }
}

impl TryFrom<u64> for CidVersion {
    type Error = CidErrorKind;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CidVersion::V0),
            1 => Ok(CidVersion::V1),
            other => Err(CidErrorKind::UnsupportedVersion(other)),
        }
    }
}

/// Error parsing a CID from a string or bytes
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("invalid CID `{source}`: {kind}")]
#[diagnostic(url("https://github.com/multiformats/cid"))]
pub struct CidError {
    /// The offending input; hex for binary input
    #[source_code]
    pub source: String,
    /// What was wrong with it
    #[source]
    #[diagnostic_source]
    pub kind: CidErrorKind,
}

impl CidError {
    fn new(source: impl Into<String>, kind: impl Into<CidErrorKind>) -> Self {
        Self {
            source: source.into(),
            kind: kind.into(),
        }
    }

    fn bytes(source: &[u8], kind: impl Into<CidErrorKind>) -> Self {
        Self::new(multibase::encode_bare(Base::Base16Lower, source), kind)
    }
}

/// The specific CID format problem
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CidErrorKind {
    /// Nothing to parse
    #[error("empty input")]
    #[diagnostic(code(weft::types::cid::empty))]
    Empty,
    /// String body isn't valid in its multibase
    #[error(transparent)]
    #[diagnostic(transparent)]
    Multibase(#[from] MultibaseError),
    /// Version or codec varint is cut short or too large
    #[error("bad varint: {0}")]
    #[diagnostic(code(weft::types::cid::varint))]
    Varint(#[from] VarintError),
    /// Version other than 0 or 1
    #[error("unsupported CID version {0}")]
    #[diagnostic(code(weft::types::cid::version))]
    UnsupportedVersion(u64),
    /// v0 CIDs must be a dag-pb SHA-256 multihash
    #[error("v0 CIDs must hold a 32-byte SHA-256 digest with the dag-pb codec")]
    #[diagnostic(code(weft::types::cid::v0))]
    InvalidV0,
    /// Multihash header doesn't describe the bytes that follow
    #[error("malformed multihash: {0}")]
    #[diagnostic(code(weft::types::cid::multihash))]
    InvalidMultihash(#[from] multihash::Error),
    /// A prefixed string held a v0 CID; those are only written as bare base58btc
    #[error("v0 CIDs can't carry a multibase prefix")]
    #[diagnostic(
        code(weft::types::cid::prefixed_v0),
        help("write v0 CIDs as the 46-character `Qm...` string")
    )]
    PrefixedV0,
}

/// Multihash with room for digests up to 64 bytes.
pub type CidMultihash = Multihash<64>;

/// A [Content Identifier]: version, codec, and the multihash of the content.
///
/// Equality and hashing look only at those three parts. The canonical string form
/// (base58btc for v0, `b` + lowercase base32 for v1) is computed once on
/// construction.
///
/// [Content Identifier]: https://atproto.com/specs/data-model#link-and-cid-formats
#[derive(Clone)]
pub struct Cid {
    version: CidVersion,
    codec: u64,
    hash: Bytes,
    multihash: CidMultihash,
    s: SmolStr,
}

fn is_v0_hash(hash: &[u8]) -> bool {
    hash.len() == V0_HASH_LEN && hash[0] == SHA2_256 as u8 && hash[1] == 0x20
}

impl Cid {
    /// Parse a CID string.
    ///
    /// `Qm…` strings of length 46 are read as v0 (base58btc, no prefix). Anything else
    /// must carry a multibase prefix (`b`/`B` for base32 or `z` for base58btc) over
    /// `[0x01][varint codec][multihash]`.
    pub fn new(cid: &str) -> Result<Self, CidError> {
        if cid.is_empty() {
            return Err(CidError::new(cid, CidErrorKind::Empty));
        }
        if cid.starts_with("Qm") && cid.len() == V0_STR_LEN {
            let hash = multibase::decode_bare(Base::Base58Btc, cid)
                .map_err(|e| CidError::new(cid, e))?;
            return Self::parse_v0(Bytes::from(hash)).map_err(|kind| CidError::new(cid, kind));
        }
        let (_, bytes) = multibase::decode(cid).map_err(|e| CidError::new(cid, e))?;
        Self::parse_prefixed(&bytes).map_err(|kind| CidError::new(cid, kind))
    }

    /// Parse the binary form.
    ///
    /// v1 is `[0x01][varint codec][multihash]`. v0 is the bare 34-byte multihash, or
    /// the same hash behind an explicit `0x00` version byte.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CidError> {
        let parsed = if is_v0_hash(bytes) {
            Self::parse_v0(Bytes::copy_from_slice(bytes))
        } else {
            match bytes.split_first() {
                Some((&0, hash)) => Self::parse_v0(Bytes::copy_from_slice(hash)),
                _ => Self::parse_prefixed(bytes),
            }
        };
        parsed.map_err(|kind| CidError::bytes(bytes, kind))
    }

    /// `[version byte][varint codec][multihash]`, where only version 1 is accepted.
    fn parse_prefixed(bytes: &[u8]) -> Result<Self, CidErrorKind> {
        let Some((&version, rest)) = bytes.split_first() else {
            return Err(CidErrorKind::Empty);
        };
        match CidVersion::try_from(u64::from(version))? {
            CidVersion::V0 => Err(CidErrorKind::PrefixedV0),
            CidVersion::V1 => {
                let (codec, codec_len) = varint::decode(rest)?;
                Self::parse_v1(codec, Bytes::copy_from_slice(&rest[codec_len..]))
            }
        }
    }

    fn parse_v0(hash: Bytes) -> Result<Self, CidErrorKind> {
        if !is_v0_hash(&hash) {
            return Err(CidErrorKind::InvalidV0);
        }
        let multihash = CidMultihash::from_bytes(&hash)?;
        Ok(Self::build(CidVersion::V0, DAG_PB_CODEC, hash, multihash))
    }

    fn parse_v1(codec: u64, hash: Bytes) -> Result<Self, CidErrorKind> {
        let multihash = CidMultihash::from_bytes(&hash)?;
        Ok(Self::build(CidVersion::V1, codec, hash, multihash))
    }

    /// Assemble a CID from its parts, checking that they agree.
    pub fn from_parts(
        version: CidVersion,
        codec: u64,
        hash: impl Into<Bytes>,
    ) -> Result<Self, CidError> {
        let hash = hash.into();
        let parsed = match version {
            CidVersion::V0 if codec != DAG_PB_CODEC => Err(CidErrorKind::InvalidV0),
            CidVersion::V0 => Self::parse_v0(hash.clone()),
            CidVersion::V1 => Self::parse_v1(codec, hash.clone()),
        };
        parsed.map_err(|kind| CidError::bytes(&hash, kind))
    }

    /// A v1 CID for `codec` over an encoded multihash.
    pub fn new_v1(codec: u64, multihash: impl Into<Bytes>) -> Result<Self, CidError> {
        Self::from_parts(CidVersion::V1, codec, multihash)
    }

    /// Parts have been checked.
    fn build(version: CidVersion, codec: u64, hash: Bytes, multihash: CidMultihash) -> Self {
        let s = match version {
            CidVersion::V0 => multibase::encode_bare(Base::Base58Btc, &hash),
            CidVersion::V1 => multibase::encode(ATP_CID_BASE, Self::v1_bytes(codec, &hash)),
        };
        Self {
            version,
            codec,
            hash,
            multihash,
            s: SmolStr::new(s),
        }
    }

    fn v1_bytes(codec: u64, hash: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + varint::encoded_len(codec) + hash.len());
        out.push(1);
        varint::encode_into(codec, &mut out);
        out.extend_from_slice(hash);
        out
    }

    /// CID version.
    pub fn version(&self) -> CidVersion {
        self.version
    }

    /// Multicodec of the content, e.g. [`DAG_CBOR_CODEC`].
    pub fn codec(&self) -> u64 {
        self.codec
    }

    /// The full multihash, header included.
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    /// The decoded multihash.
    pub fn multihash(&self) -> &CidMultihash {
        &self.multihash
    }

    /// Multihash function code, e.g. [`SHA2_256`].
    pub fn hash_code(&self) -> u64 {
        self.multihash.code()
    }

    /// The digest bytes with the multihash header stripped.
    pub fn digest(&self) -> &[u8] {
        self.multihash.digest()
    }

    /// The binary form, as read by [`Cid::from_bytes`].
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.version {
            CidVersion::V0 => self.hash.to_vec(),
            CidVersion::V1 => Self::v1_bytes(self.codec, &self.hash),
        }
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.s
    }

    /// Convert to the `cid` crate's type.
    #[cfg(feature = "ipld")]
    pub fn to_ipld(&self) -> Result<IpldCid, cid::Error> {
        IpldCid::try_from(self.to_bytes().as_slice())
    }
}

impl PartialEq for Cid {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.codec == other.codec && self.hash == other.hash
    }
}

impl Eq for Cid {}

impl Hash for Cid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.hash(state);
        self.codec.hash(state);
        self.hash.hash(state);
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({:?})", self.s)
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.s)
    }
}

impl FromStr for Cid {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&[u8]> for Cid {
    type Error = CidError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

impl TryFrom<String> for Cid {
    type Error = CidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

#[cfg(feature = "ipld")]
impl TryFrom<&IpldCid> for Cid {
    type Error = CidError;

    fn try_from(value: &IpldCid) -> Result<Self, Self::Error> {
        Self::from_bytes(&value.to_bytes())
    }
}

#[cfg(feature = "ipld")]
impl TryFrom<IpldCid> for Cid {
    type Error = CidError;

    fn try_from(value: IpldCid) -> Result<Self, Self::Error> {
        Self::try_from(&value)
    }
}

impl IntoStatic for Cid {
    type Output = Cid;

    fn into_static(self) -> Self::Output {
        self
    }
}

impl From<Cid> for String {
    fn from(value: Cid) -> Self {
        value.s.to_string()
    }
}

impl AsRef<str> for Cid {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Cid {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl Serialize for Cid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(self.as_str())
        } else {
            serializer.serialize_bytes(&self.to_bytes())
        }
    }
}

struct CidVisitor;

impl Visitor<'_> for CidVisitor {
    type Value = Cid;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a CID string or CID bytes")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Cid::new(v).map_err(E::custom)
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Cid::from_bytes(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(CidVisitor)
        } else {
            deserializer.deserialize_bytes(CidVisitor)
        }
    }
}

/// CID link wrapper that serializes as {"$link": "cid"} in JSON
/// and as raw CID in binary formats
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CidLink(pub Cid);

impl CidLink {
    /// Parse a CID string into a link.
    pub fn new(cid: &str) -> Result<Self, CidError> {
        Cid::new(cid).map(Self)
    }

    /// The canonical string form of the linked CID.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Unwrap the linked CID.
    pub fn into_inner(self) -> Cid {
        self.0
    }
}

impl fmt::Display for CidLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CidLink {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl IntoStatic for CidLink {
    type Output = CidLink;

    fn into_static(self) -> Self::Output {
        self
    }
}

impl Serialize for CidLink {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            use serde::ser::SerializeMap;
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("$link", self.0.as_str())?;
            map.end()
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for CidLink {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if !deserializer.is_human_readable() {
            return Cid::deserialize(deserializer).map(CidLink);
        }

        struct LinkVisitor;

        impl<'de> Visitor<'de> for LinkVisitor {
            type Value = CidLink;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a CID link object with $link field")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                use serde::de::Error;

                let mut link: Option<SmolStr> = None;
                while let Some(key) = map.next_key::<SmolStr>()? {
                    if key == "$link" {
                        link = Some(map.next_value()?);
                    } else {
                        let _: de::IgnoredAny = map.next_value()?;
                    }
                }
                match link {
                    Some(cid) => CidLink::new(&cid).map_err(A::Error::custom),
                    None => Err(A::Error::missing_field("$link")),
                }
            }
        }

        deserializer.deserialize_map(LinkVisitor)
    }
}

impl From<Cid> for CidLink {
    fn from(value: Cid) -> Self {
        CidLink(value)
    }
}

impl From<CidLink> for Cid {
    fn from(value: CidLink) -> Self {
        value.0
    }
}

impl AsRef<str> for CidLink {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl Deref for CidLink {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CID: &str = "bafyreievgu2ty7qbiaaom5zhmkznsnajuzideek3lo7e65dwqlrvrxnmo4";
    const V0_CID: &str = "QmY7Yh4UquoXHLPFo2XbhXkhBvFoPwmQUSa92pxnxjQuPU";

    #[test]
    fn parses_v1() {
        let cid = Cid::new(TEST_CID).unwrap();
        assert_eq!(cid.version(), CidVersion::V1);
        assert_eq!(cid.codec(), DAG_CBOR_CODEC);
        assert_eq!(cid.hash_code(), SHA2_256);
        assert_eq!(cid.hash().len(), 34);
        assert_eq!(cid.digest().len(), 32);
        assert_eq!(cid.to_string(), TEST_CID);
        assert_eq!(cid.to_bytes()[..4], [0x01, 0x71, 0x12, 0x20]);
    }

    #[test]
    fn parts_roundtrip() {
        let cid = Cid::new(TEST_CID).unwrap();
        let rebuilt = Cid::from_parts(cid.version(), cid.codec(), cid.hash().to_vec()).unwrap();
        assert_eq!(rebuilt, cid);
        assert_eq!(rebuilt.as_str(), TEST_CID);

        let raw = Cid::new_v1(RAW_CODEC, cid.hash().to_vec()).unwrap();
        assert_eq!(
            raw.as_str(),
            "bafkreievgu2ty7qbiaaom5zhmkznsnajuzideek3lo7e65dwqlrvrxnmo4"
        );
        assert_ne!(raw, cid);
    }

    #[test]
    fn other_bases_normalize() {
        let upper = Cid::new("BAFYREIEVGU2TY7QBIAAOM5ZHMKZNSNAJUZIDEEK3LO7E65DWQLRVRXNMO4").unwrap();
        let base58 = Cid::new("zdpuAvTtHaLEnp2qHYtBkXGwPdW2Rvu17erKXiZKaJmQ4DNGn").unwrap();
        assert_eq!(upper.as_str(), TEST_CID);
        assert_eq!(base58.as_str(), TEST_CID);
        assert_eq!(upper, base58);
    }

    #[test]
    fn parses_v0() {
        let cid = Cid::new(V0_CID).unwrap();
        assert_eq!(cid.version(), CidVersion::V0);
        assert_eq!(cid.codec(), DAG_PB_CODEC);
        assert_eq!(cid.hash_code(), SHA2_256);
        assert_eq!(cid.digest().len(), 32);
        assert_eq!(cid.to_string(), V0_CID);
        assert_eq!(cid.to_bytes().len(), 34);

        let upgraded = Cid::new_v1(DAG_PB_CODEC, cid.hash().to_vec()).unwrap();
        assert_eq!(
            upgraded.as_str(),
            "bafybeierhgbz4zp2x2u67urqrgfnrnlukciupzenpqpipiz5nwtq7uxpx4"
        );
        assert_ne!(upgraded, cid);
    }

    #[test]
    fn bytes_roundtrip() {
        for s in [TEST_CID, V0_CID] {
            let cid = Cid::new(s).unwrap();
            assert_eq!(Cid::from_bytes(&cid.to_bytes()).unwrap(), cid);
        }

        let v0 = Cid::new(V0_CID).unwrap();
        let mut explicit = vec![0x00];
        explicit.extend_from_slice(v0.hash());
        assert_eq!(Cid::from_bytes(&explicit).unwrap(), v0);
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(Cid::new("").unwrap_err().kind, CidErrorKind::Empty));
        assert!(matches!(
            Cid::new("xafyrei").unwrap_err().kind,
            CidErrorKind::Multibase(MultibaseError::UnsupportedEncoding('x'))
        ));
        assert!(matches!(
            Cid::new("b!!!").unwrap_err().kind,
            CidErrorKind::Multibase(MultibaseError::Decode { .. })
        ));
        assert!(matches!(
            Cid::from_bytes(&[0x02, 0x71, 0x12, 0x00]).unwrap_err().kind,
            CidErrorKind::UnsupportedVersion(2)
        ));
        assert!(matches!(
            Cid::from_bytes(&[0x01, 0xff]).unwrap_err().kind,
            CidErrorKind::Varint(VarintError::Truncated { .. })
        ));
        assert!(matches!(
            Cid::from_bytes(&[0x01, 0x71, 0x12, 0x20, 0xab]).unwrap_err().kind,
            CidErrorKind::InvalidMultihash(_)
        ));
        assert!(matches!(
            Cid::from_bytes(&[0x00, 0x12, 0x20]).unwrap_err().kind,
            CidErrorKind::InvalidV0
        ));
        assert!(matches!(
            Cid::from_parts(CidVersion::V0, DAG_CBOR_CODEC, Cid::new(V0_CID).unwrap().hash().to_vec())
                .unwrap_err()
                .kind,
            CidErrorKind::InvalidV0
        ));
        // truncated v1 string
        assert!(Cid::new(&TEST_CID[..20]).is_err());
    }

    #[test]
    fn prefixed_strings_need_version_one() {
        let v0 = Cid::new(V0_CID).unwrap();

        // a bare multihash behind a multibase prefix reads 0x12 as the version
        let bare = multibase::encode(Base::Base32Lower, v0.hash());
        assert_eq!(bare, "bciqjcomdtzs7vpvj57jdbcmk3c2xiueri7si27a6q6rt23nhb7jo7py");
        assert!(matches!(
            Cid::new(&bare).unwrap_err().kind,
            CidErrorKind::UnsupportedVersion(0x12)
        ));

        let mut explicit = vec![0x00];
        explicit.extend_from_slice(v0.hash());
        let prefixed_v0 = multibase::encode(Base::Base32Lower, &explicit);
        assert!(matches!(
            Cid::new(&prefixed_v0).unwrap_err().kind,
            CidErrorKind::PrefixedV0
        ));
    }

    #[test]
    fn version_is_a_single_byte() {
        let cid = Cid::new(TEST_CID).unwrap();
        // 0x81 0x00 would be a two-byte varint for 1
        let mut overlong = vec![0x81, 0x00];
        overlong.extend_from_slice(&cid.to_bytes()[1..]);

        let err = Cid::from_bytes(&overlong).unwrap_err();
        assert!(matches!(err.kind, CidErrorKind::UnsupportedVersion(0x81)));
        let err = Cid::new(&multibase::encode(Base::Base32Lower, &overlong)).unwrap_err();
        assert!(matches!(err.kind, CidErrorKind::UnsupportedVersion(0x81)));
    }

    #[test]
    fn multihash_is_checked() {
        let cid = Cid::new(TEST_CID).unwrap();
        assert_eq!(cid.multihash().code(), SHA2_256);
        assert_eq!(cid.multihash().size(), 32);
        assert_eq!(cid.multihash().to_bytes(), cid.hash());

        // trailing byte after the digest
        let mut long = cid.hash().to_vec();
        long.push(0);
        assert!(matches!(
            Cid::new_v1(DAG_CBOR_CODEC, long).unwrap_err().kind,
            CidErrorKind::InvalidMultihash(_)
        ));

        // digest larger than 64 bytes
        let mut oversized = vec![0x13, 0x41];
        oversized.extend_from_slice(&[0u8; 0x41]);
        assert!(matches!(
            Cid::new_v1(RAW_CODEC, oversized).unwrap_err().kind,
            CidErrorKind::InvalidMultihash(_)
        ));
    }

    #[test]
    fn serde_string_and_link() {
        let cid: Cid = serde_json::from_str(&format!("\"{TEST_CID}\"")).unwrap();
        assert_eq!(serde_json::to_string(&cid).unwrap(), format!("\"{TEST_CID}\""));

        let link = CidLink(cid.clone());
        let json = serde_json::to_string(&link).unwrap();
        assert_eq!(json, format!(r#"{{"$link":"{TEST_CID}"}}"#));
        let parsed: CidLink = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.into_inner(), cid);

        assert!(serde_json::from_str::<CidLink>(r#"{"cid":"x"}"#).is_err());
        assert!(serde_json::from_str::<CidLink>(r#"{"$link":"nope"}"#).is_err());
    }

    #[cfg(feature = "ipld")]
    #[test]
    fn ipld_interop() {
        let cid = Cid::new(TEST_CID).unwrap();
        let ipld = cid.to_ipld().unwrap();
        assert_eq!(ipld.to_string(), TEST_CID);
        assert_eq!(ipld.codec(), DAG_CBOR_CODEC);
        assert_eq!(Cid::try_from(ipld).unwrap(), cid);

        let v0 = IpldCid::try_from(V0_CID).unwrap();
        assert_eq!(Cid::try_from(&v0).unwrap().as_str(), V0_CID);
    }
}

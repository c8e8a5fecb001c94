use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::SmolStr;
use std::fmt;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::{ops::Deref, str::FromStr};

use crate::CowStr;
use crate::codec::s32;
use crate::types::recordkey::RecordKeyType;
use crate::types::string::AtStrError;
use rand::Rng;
use regex::Regex;

/// Length of every TID.
pub const TID_LEN: usize = 13;

/// Characters holding the timestamp; the rest hold the clock id.
pub const TIMESTAMP_LEN: usize = 11;

/// Largest timestamp a TID can hold: the top bit of the 64-bit layout stays zero.
pub const MAX_TIMESTAMP: u64 = (1 << 53) - 1;

/// Largest clock id the two trailing characters can hold.
pub const MAX_CLOCK_ID: u16 = 1023;

/// Generators pick their clock id from `0..GENERATED_CLOCK_IDS`.
pub const GENERATED_CLOCK_IDS: u16 = 32;

static TID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[234567abcdefghij][234567abcdefghijklmnopqrstuvwxyz]{12}$").unwrap()
});

/// Errors building a TID from its numeric parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum TidError {
    /// Negative, or too large for the 53 timestamp bits
    #[error("timestamp {0} is outside the range a TID can represent")]
    #[diagnostic(code(weft::types::tid::timestamp_range))]
    TimestampOutOfRange(i64),
    /// Doesn't fit the two clock id characters
    #[error("clock id {0} is larger than {MAX_CLOCK_ID}")]
    #[diagnostic(code(weft::types::tid::clock_id_range))]
    ClockIdOutOfRange(u16),
}

/// A [Timestamp Identifier].
///
/// Thirteen sortable-base32 characters: eleven for microseconds since the UNIX
/// epoch, two for a clock id. Because the alphabet is in ASCII order and the width
/// is fixed, comparing TIDs as strings compares them chronologically.
///
/// Input is accepted in either case and stored lower-cased.
///
/// [Timestamp Identifier]: https://atproto.com/specs/tid
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Hash)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Tid(SmolStr);

fn validate(tid: &str) -> Result<SmolStr, AtStrError> {
    if tid.len() > TID_LEN {
        return Err(AtStrError::too_long("tid", tid, TID_LEN, tid.len()));
    }
    if tid.len() < TID_LEN {
        return Err(AtStrError::too_short("tid", tid, TID_LEN, tid.len()));
    }
    for (i, c) in tid.char_indices() {
        let digit = u8::try_from(c).ok().and_then(s32::digit);
        match digit {
            None => return Err(AtStrError::bad_char("tid", tid, i, c)),
            Some(d) if i == 0 && d >= 16 => {
                return Err(AtStrError::invalid_at(
                    "tid",
                    tid,
                    (0, 1),
                    "first character must be one of 234567abcdefghij",
                ));
            }
            Some(_) => {}
        }
    }
    let lower = SmolStr::new(tid.to_ascii_lowercase());
    if !TID_REGEX.is_match(&lower) {
        return Err(AtStrError::regex(
            "tid",
            tid,
            SmolStr::new_static("didn't match schema"),
        ));
    }
    Ok(lower)
}

impl Tid {
    /// Parses a `TID` from the given string.
    pub fn new(tid: impl AsRef<str>) -> Result<Self, AtStrError> {
        validate(tid.as_ref()).map(Self)
    }

    /// Infallible constructor for when you *know* the string is a valid TID.
    ///
    /// # Panics
    ///
    /// Panics with the validation error if `tid` is not a valid TID.
    pub fn raw(tid: impl AsRef<str>) -> Self {
        match validate(tid.as_ref()) {
            Ok(tid) => Self(tid),
            Err(e) => panic!("invalid TID: {e}"),
        }
    }

    /// Builds a TID from a microsecond timestamp and a clock id.
    pub fn from_parts(timestamp: u64, clock_id: u16) -> Result<Self, TidError> {
        if timestamp > MAX_TIMESTAMP {
            return Err(TidError::TimestampOutOfRange(
                i64::try_from(timestamp).unwrap_or(i64::MAX),
            ));
        }
        if clock_id > MAX_CLOCK_ID {
            return Err(TidError::ClockIdOutOfRange(clock_id));
        }
        Ok(Self::encode(timestamp, clock_id))
    }

    /// Both parts must already be in range.
    fn encode(timestamp: u64, clock_id: u16) -> Self {
        let mut s = String::with_capacity(TID_LEN);
        s.push_str(&s32::encode_padded(timestamp, TIMESTAMP_LEN));
        s.push_str(&s32::encode_padded(clock_id as u64, TID_LEN - TIMESTAMP_LEN));
        Self(SmolStr::new(s))
    }

    /// Construct a TID for `time` with the given clock id.
    ///
    /// If you have multiple clock sources, use `clock_id` to tell them apart. With a
    /// single source `0` is fine.
    pub fn from_datetime(
        clock_id: u16,
        time: chrono::DateTime<chrono::Utc>,
    ) -> Result<Self, TidError> {
        let micros = time.timestamp_micros();
        let timestamp = u64::try_from(micros).map_err(|_| TidError::TimestampOutOfRange(micros))?;
        Self::from_parts(timestamp, clock_id)
    }

    /// A fresh TID from the process-wide generator.
    ///
    /// Successive calls, from any thread, return strictly increasing values.
    ///
    /// # Panics
    ///
    /// Panics if the system clock reads past [`MAX_TIMESTAMP`] (the year 2255).
    pub fn now() -> Self {
        default_generator().next_tid()
    }

    /// Microseconds since the UNIX epoch.
    ///
    /// Parsing admits a leading character up to `j`, so a parsed TID can carry up to
    /// 54 timestamp bits and this may exceed [`MAX_TIMESTAMP`]. [`Tid::from_parts`] and
    /// the generators only produce 53-bit timestamps.
    pub fn timestamp(&self) -> u64 {
        // validated on construction, so both halves decode
        s32::decode(&self.0[..TIMESTAMP_LEN]).unwrap_or_default()
    }

    /// The clock id in the trailing two characters.
    pub fn clock_id(&self) -> u16 {
        s32::decode(&self.0[TIMESTAMP_LEN..]).unwrap_or_default() as u16
    }

    /// The timestamp as a UTC datetime.
    pub fn to_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        let micros = i64::try_from(self.timestamp()).ok()?;
        chrono::DateTime::from_timestamp_micros(micros)
    }

    /// Returns the TID as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Source of wall-clock time for a [`TidGenerator`].
pub trait TidClock: Send + Sync {
    /// Microseconds since the UNIX epoch.
    fn now_micros(&self) -> u64;
}

/// The system clock, via [`chrono::Utc::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TidClock for SystemClock {
    fn now_micros(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_micros()).unwrap_or_default()
    }
}

impl<F> TidClock for F
where
    F: Fn() -> u64 + Send + Sync,
{
    fn now_micros(&self) -> u64 {
        self()
    }
}

#[derive(Debug)]
struct GeneratorState {
    clock_id: Option<u16>,
    last_timestamp: u64,
}

/// Generates strictly increasing TIDs.
///
/// The clock id is drawn at random from `0..32` on first use unless fixed with
/// [`TidGenerator::with_clock_id`]. Each call takes `max(now, last + 1)` as its
/// timestamp, so values keep increasing when the clock stalls or steps backwards.
/// All state sits behind one mutex held only for the read-modify-write.
#[derive(Debug)]
pub struct TidGenerator<C = SystemClock> {
    clock: C,
    state: Mutex<GeneratorState>,
}

impl TidGenerator<SystemClock> {
    /// Generator on the system clock with a lazily chosen clock id.
    pub const fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TidGenerator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TidClock> TidGenerator<C> {
    /// Generator reading time from `clock`.
    pub const fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: Mutex::new(GeneratorState {
                clock_id: None,
                last_timestamp: 0,
            }),
        }
    }

    /// Fix the clock id instead of picking one at random.
    pub fn with_clock_id(self, clock_id: u16) -> Result<Self, TidError> {
        if clock_id > MAX_CLOCK_ID {
            return Err(TidError::ClockIdOutOfRange(clock_id));
        }
        let mut state = self.state.into_inner().unwrap_or_else(PoisonError::into_inner);
        state.clock_id = Some(clock_id);
        Ok(Self {
            clock: self.clock,
            state: Mutex::new(state),
        })
    }

    /// The clock id stamped on every TID from this generator, choosing it if needed.
    pub fn clock_id(&self) -> u16 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state.clock_id.get_or_insert_with(random_clock_id)
    }

    /// The next TID.
    ///
    /// # Panics
    ///
    /// Panics once the timestamp would pass [`MAX_TIMESTAMP`]; see
    /// [`TidGenerator::try_next_tid`].
    pub fn next_tid(&self) -> Tid {
        match self.try_next_tid() {
            Ok(tid) => tid,
            Err(e) => panic!("TID generator exhausted: {e}"),
        }
    }

    /// The next TID, or an error once the clock or watermark passes [`MAX_TIMESTAMP`].
    ///
    /// A failed call leaves the generator unchanged.
    pub fn try_next_tid(&self) -> Result<Tid, TidError> {
        // the state is two integers updated together, so a poisoned lock is still consistent
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let clock_id = *state.clock_id.get_or_insert_with(random_clock_id);
        let now = self.clock.now_micros();
        let timestamp = if now < state.last_timestamp {
            #[cfg(feature = "tracing")]
            tracing::trace!(
                now,
                watermark = state.last_timestamp,
                "clock has not advanced, using watermark"
            );
            state.last_timestamp
        } else {
            now
        };
        if timestamp > MAX_TIMESTAMP {
            return Err(TidError::TimestampOutOfRange(
                i64::try_from(timestamp).unwrap_or(i64::MAX),
            ));
        }
        state.last_timestamp = timestamp + 1;
        drop(state);
        Ok(Tid::encode(timestamp, clock_id))
    }
}

fn random_clock_id() -> u16 {
    let clock_id = rand::rng().random_range(0..GENERATED_CLOCK_IDS);
    #[cfg(feature = "tracing")]
    tracing::debug!(clock_id, "picked TID clock id");
    clock_id
}

static DEFAULT_GENERATOR: TidGenerator = TidGenerator::new();

/// The process-wide generator behind [`Tid::now`].
pub fn default_generator() -> &'static TidGenerator {
    &DEFAULT_GENERATOR
}

impl FromStr for Tid {
    type Err = AtStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Tid {
    type Error = AtStrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Tid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: CowStr<'de> = Deserialize::deserialize(deserializer)?;
        Self::new(value).map_err(D::Error::custom)
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Tid> for String {
    fn from(value: Tid) -> Self {
        value.0.to_string()
    }
}

impl From<Tid> for SmolStr {
    fn from(value: Tid) -> Self {
        value.0
    }
}

impl AsRef<str> for Tid {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Tid {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl crate::IntoStatic for Tid {
    type Output = Tid;

    fn into_static(self) -> Self::Output {
        self
    }
}

unsafe impl RecordKeyType for Tid {
    fn as_str(&self) -> &str {
        self.as_str()
    }
}

//! Well-defined alternatives to types in std::time.
//! Provides a signed Duration and UTC timestamps with
//! nanoseconds precision.
use std::fmt;
use time::format_description::well_known::Rfc3339;

/// A signed Duration.
pub type Duration = time::Duration;

/// Monotonic clock time.
pub type Instant = time::Instant;

/// UTC time in nanoseconds precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Utc(pub(crate) Duration);

impl fmt::Debug for Utc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Start of the unix epoch.
pub const UNIX_EPOCH: Utc = Utc(Duration::ZERO);

/// Error returned when a timestamp is not a valid RFC3339 string.
#[derive(Debug, thiserror::Error)]
#[error("invalid RFC3339 timestamp {0:?}: {1}")]
pub struct ParseUtcError(String, #[source] time::error::Parse);

impl Utc {
    /// Constructs a timestamp `d` after the unix epoch.
    pub fn from_unix(d: Duration) -> Self {
        Self(d)
    }

    /// Time elapsed since the unix epoch.
    pub fn since_unix(&self) -> Duration {
        self.0
    }

    /// Whether this is the unix epoch itself, which is used
    /// as the "unset" timestamp.
    pub fn is_zero(&self) -> bool {
        *self == UNIX_EPOCH
    }

    fn to_offset_date_time(self) -> Option<time::OffsetDateTime> {
        time::OffsetDateTime::UNIX_EPOCH.checked_add(self.0)
    }

    /// Parses an RFC3339 timestamp.
    pub fn parse_rfc3339(s: &str) -> Result<Self, ParseUtcError> {
        let t = time::OffsetDateTime::parse(s, &Rfc3339).map_err(|err| ParseUtcError(s.into(), err))?;
        Ok(Self(t - time::OffsetDateTime::UNIX_EPOCH))
    }
}

/// RFC3339 representation, used both for display and for the canonical
/// encoding of signed timestamps. Timestamps outside of the RFC3339 range
/// are rendered as raw unix nanoseconds.
impl fmt::Display for Utc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_offset_date_time().and_then(|t| t.format(&Rfc3339).ok()) {
            Some(s) => f.write_str(&s),
            None => write!(f, "{}ns", self.0.whole_nanoseconds()),
        }
    }
}

impl serde::Serialize for Utc {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Utc {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::parse_rfc3339(&s).map_err(serde::de::Error::custom)
    }
}

impl std::ops::Add<Duration> for Utc {
    type Output = Self;

    fn add(self, d: Duration) -> Self {
        Self(self.0 + d)
    }
}

impl std::ops::AddAssign<Duration> for Utc {
    fn add_assign(&mut self, d: Duration) {
        self.0 += d;
    }
}

impl std::ops::Sub<Duration> for Utc {
    type Output = Self;
    fn sub(self, d: Duration) -> Self {
        Self(self.0 - d)
    }
}

impl std::ops::SubAssign<Duration> for Utc {
    fn sub_assign(&mut self, d: Duration) {
        self.0 -= d;
    }
}

impl std::ops::Sub<Utc> for Utc {
    type Output = Duration;
    fn sub(self, b: Self) -> Duration {
        self.0 - b.0
    }
}

use std::time::Duration;
use std::{fmt, ops};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};


// Wall-clock timestamp. Clock deadlines come from the server as absolute timestamps, so
// monotonic `Instant`s cannot be used here.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub const UNIX_EPOCH: Self = Self(OffsetDateTime::UNIX_EPOCH);
    pub fn now() -> Self { Self(OffsetDateTime::now_utc()) }

    // Accepts RFC 3339 as well as offset-less ISO 8601 (the latter is assumed to be UTC).
    pub fn parse(s: &str) -> Result<Self, String> {
        if let Ok(odt) = OffsetDateTime::parse(s, &Rfc3339) {
            return Ok(odt.into());
        }
        PrimitiveDateTime::parse(s, &Iso8601::DEFAULT)
            .map(|pdt| pdt.assume_utc().into())
            .map_err(|err| format!("invalid timestamp {s:?}: {err}"))
    }

    pub fn to_rfc3339(self) -> String {
        // Formatting a UTC timestamp with a four-digit year cannot fail.
        self.0.format(&Rfc3339).unwrap_or_else(|_| self.0.to_string())
    }

    // Returns zero if `earlier` is in fact later than `self`.
    pub fn saturating_duration_since(self, earlier: UtcDateTime) -> Duration {
        Duration::try_from(self.0 - earlier.0).unwrap_or(Duration::ZERO)
    }
}

impl From<OffsetDateTime> for UtcDateTime {
    fn from(odt: OffsetDateTime) -> Self { Self(odt.to_offset(UtcOffset::UTC)) }
}

impl From<UtcDateTime> for OffsetDateTime {
    fn from(udt: UtcDateTime) -> Self { udt.0 }
}

impl ops::Add<Duration> for UtcDateTime {
    type Output = Self;
    fn add(self, d: Duration) -> Self { Self(self.0 + d) }
}

impl ops::Sub<Duration> for UtcDateTime {
    type Output = Self;
    fn sub(self, d: Duration) -> Self { Self(self.0 - d) }
}

impl fmt::Display for UtcDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_rfc3339()) }
}

impl Serialize for UtcDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        UtcDateTime::parse(&s).map_err(serde::de::Error::custom)
    }
}

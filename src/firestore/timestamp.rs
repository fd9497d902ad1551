//! Firestore Timestamp type

use crate::error::FirestoreError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::field_value::Value;

const NANOS_PER_MILLI: i64 = 1_000_000;

/// Firestore timestamp
///
/// A seconds + nanoseconds pair since the Unix epoch. Timestamps compare by
/// seconds, then nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Seconds since Unix epoch
    pub seconds: i64,

    /// Nanoseconds component (0-999,999,999)
    pub nanoseconds: i32,
}

impl Timestamp {
    /// Create a new timestamp
    pub fn new(seconds: i64, nanoseconds: i32) -> Result<Self, FirestoreError> {
        if !(0..1_000_000_000).contains(&nanoseconds) {
            return Err(FirestoreError::InvalidArgument(format!(
                "nanoseconds must be in range [0, 999999999], got {}",
                nanoseconds
            )));
        }

        Ok(Self {
            seconds,
            nanoseconds,
        })
    }

    /// Get current timestamp
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Convert from DateTime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanoseconds: dt.timestamp_subsec_nanos() as i32,
        }
    }

    /// Convert to DateTime
    ///
    /// Returns `None` when the timestamp lies outside the range chrono can represent.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanoseconds as u32)
    }

    /// Create from milliseconds since the Unix epoch
    pub fn from_millis(millis: i64) -> Self {
        Self {
            seconds: millis.div_euclid(1000),
            nanoseconds: (millis.rem_euclid(1000) * NANOS_PER_MILLI) as i32,
        }
    }

    /// Milliseconds since the Unix epoch (sub-millisecond precision truncated)
    ///
    /// Saturates at `i64::MIN`/`i64::MAX` for instants outside that range.
    pub fn to_millis(&self) -> i64 {
        self.seconds
            .saturating_mul(1000)
            .saturating_add(i64::from(self.nanoseconds) / NANOS_PER_MILLI)
    }

    /// Wrap into a document [`Value`]
    pub fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seconds
            .cmp(&other.seconds)
            .then(self.nanoseconds.cmp(&other.nanoseconds))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => write!(f, "Timestamp(seconds={}, nanoseconds={})", self.seconds, self.nanoseconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_creation() {
        let ts = Timestamp::new(1234567890, 123456789).unwrap();
        assert_eq!(ts.seconds, 1234567890);
        assert_eq!(ts.nanoseconds, 123456789);
    }

    #[test]
    fn test_timestamp_invalid_nanoseconds() {
        assert!(Timestamp::new(0, -1).is_err());
        assert!(Timestamp::new(0, 1_000_000_000).is_err());
        assert!(Timestamp::new(0, 999_999_999).is_ok());
    }

    #[test]
    fn test_timestamp_datetime_conversion() {
        let now = Utc::now();
        let ts = Timestamp::from_datetime(now);
        let dt = ts.to_datetime().unwrap();
        assert_eq!(dt, now);
    }

    #[test]
    fn test_timestamp_millis() {
        let ts = Timestamp::from_millis(1_500);
        assert_eq!(ts.seconds, 1);
        assert_eq!(ts.nanoseconds, 500_000_000);
        assert_eq!(ts.to_millis(), 1_500);

        // Before the epoch
        let ts = Timestamp::from_millis(-1_500);
        assert_eq!(ts.seconds, -2);
        assert_eq!(ts.nanoseconds, 500_000_000);
        assert_eq!(ts.to_millis(), -1_500);
    }

    #[test]
    fn test_timestamp_millis_saturates() {
        let far = Timestamp { seconds: i64::MAX, nanoseconds: 999_999_999 };
        assert_eq!(far.to_millis(), i64::MAX);

        let early = Timestamp { seconds: i64::MIN, nanoseconds: 0 };
        assert_eq!(early.to_millis(), i64::MIN);
    }

    #[test]
    fn test_timestamp_ordering() {
        let earlier = Timestamp::new(1, 999).unwrap();
        let later = Timestamp::new(2, 0).unwrap();
        assert!(earlier < later);
        assert!(Timestamp::new(1, 5).unwrap() > Timestamp::new(1, 4).unwrap());
    }

    #[test]
    fn test_timestamp_display() {
        let ts = Timestamp::new(0, 0).unwrap();
        assert_eq!(ts.to_string(), "1970-01-01T00:00:00Z");
    }
}

//! Timestamp wrapper with a fixed RFC 3339 wire format.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Point in time carrying its UTC offset.
///
/// Serialized as RFC 3339 text (`2021-01-02T15:04:05Z`,
/// `2021-01-02T15:04:05+07:00`). Fractional seconds are emitted only when
/// present. Equality and ordering compare instants, so the same moment
/// expressed in two offsets is equal.
///
/// Optional fields should be declared as `Option<Timestamp>` with
/// `#[serde(default)]`: a JSON `null` then leaves the field unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    /// Current time in UTC, truncated to microseconds.
    ///
    /// Microseconds are the resolution of the durable store, so a value
    /// produced here survives a round trip unchanged.
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(6).fixed_offset())
    }

    /// Parse RFC 3339 text.
    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s).map(Self)
    }

    /// Build from microseconds since the Unix epoch (UTC).
    pub fn from_micros(micros: i64) -> Option<Self> {
        DateTime::from_timestamp_micros(micros).map(|dt| Self(dt.fixed_offset()))
    }

    /// The same instant in UTC, truncated to microseconds.
    ///
    /// Every store keeps event times in this form, so two backends given the
    /// same input report the same rows and the same text.
    pub fn normalized(&self) -> Self {
        Self(self.0.with_timezone(&Utc).trunc_subsecs(6).fixed_offset())
    }

    /// Microseconds since the Unix epoch.
    pub fn as_micros(&self) -> i64 {
        self.0.timestamp_micros()
    }

    /// The wrapped date-time.
    pub fn inner(&self) -> &DateTime<FixedOffset> {
        &self.0
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self(dt)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.fixed_offset())
    }
}

impl std::ops::Add<chrono::Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: chrono::Duration) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl std::ops::Sub<chrono::Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: chrono::Duration) -> Self::Output {
        Self(self.0 - rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default)]
        time_stamp: Option<Timestamp>,
    }

    #[test]
    fn test_display_utc_uses_z() {
        let ts = Timestamp::parse("2021-01-02T15:04:05Z").unwrap();
        assert_eq!(ts.to_string(), "2021-01-02T15:04:05Z");
    }

    #[test]
    fn test_display_keeps_offset() {
        let ts = Timestamp::parse("2021-01-02T15:04:05+07:00").unwrap();
        assert_eq!(ts.to_string(), "2021-01-02T15:04:05+07:00");
    }

    #[test]
    fn test_equality_across_offsets() {
        let utc = Timestamp::parse("2021-01-02T08:04:05Z").unwrap();
        let plus7 = Timestamp::parse("2021-01-02T15:04:05+07:00").unwrap();
        assert_eq!(utc, plus7);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Timestamp::parse("yesterday").is_err());
        assert!(Timestamp::parse("2021-01-02 15:04:05").is_err());
    }

    #[test]
    fn test_micros_roundtrip() {
        let now = Timestamp::now();
        let back = Timestamp::from_micros(now.as_micros()).unwrap();
        assert_eq!(now, back);
    }

    #[test]
    fn test_normalized_is_utc_micros() {
        let ts = Timestamp::parse("2021-01-02T15:04:05.123456789+07:00").unwrap();
        let normalized = ts.normalized();
        assert_eq!(normalized.to_string(), "2021-01-02T08:04:05.123456Z");
        assert_eq!(normalized.as_micros(), ts.as_micros());
        assert_eq!(Timestamp::from_micros(ts.as_micros()).unwrap(), normalized);
    }

    #[test]
    fn test_normalized_before_epoch() {
        let ts = Timestamp::parse("1969-12-31T23:59:59.999999500Z").unwrap();
        assert_eq!(
            Timestamp::from_micros(ts.as_micros()).unwrap(),
            ts.normalized()
        );
    }

    #[test]
    fn test_json_null_leaves_field_unset() {
        let holder: Holder = serde_json::from_value(json!({ "time_stamp": null })).unwrap();
        assert!(holder.time_stamp.is_none());

        let holder: Holder = serde_json::from_value(json!({})).unwrap();
        assert!(holder.time_stamp.is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let holder: Holder =
            serde_json::from_value(json!({ "time_stamp": "2021-01-02T15:04:05Z" })).unwrap();
        let ts = holder.time_stamp.unwrap();
        assert_eq!(serde_json::to_value(ts).unwrap(), json!("2021-01-02T15:04:05Z"));
    }
}

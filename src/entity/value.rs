//! Declared metric types and the typed value container.
//!
//! Every measurement is persisted as text. [`TypedValue::encode`] and
//! [`TypedValue::decode`] are the pure function pair between the typed and the
//! textual form; the metric's declared [`MetricType`] decides how text is read
//! back.

use std::fmt;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString, VariantNames};
use thiserror::Error;

use super::Timestamp;

// =============================================================================
// MetricType
// =============================================================================

/// Value type a metric declares at registration time.
///
/// Wire names are upper snake case and parsing is case-sensitive.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    VariantNames,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    /// Base-10 signed 64-bit integer.
    Int,
    /// 64-bit floating point number.
    Float,
    /// Elapsed time such as `10s` or `1h 30m`.
    Duration,
    /// RFC 3339 timestamp with offset.
    TimestampWithTimezone,
    /// `true` or `false`.
    Bool,
    /// Arbitrary text.
    String,
}

// =============================================================================
// CoercionError
// =============================================================================

/// Stored text could not be read as the metric's declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot read {text:?} as {kind}: {reason}")]
pub struct CoercionError {
    /// Declared type the text was read as.
    pub kind: MetricType,
    /// Offending stored text.
    pub text: String,
    /// Parser message.
    pub reason: String,
}

impl CoercionError {
    fn new(kind: MetricType, text: &str, reason: impl fmt::Display) -> Self {
        Self {
            kind,
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// TypedValue
// =============================================================================

/// A measurement value tagged with its run-time type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Float(f64),
    Duration(Duration),
    Timestamp(Timestamp),
    Bool(bool),
    String(String),
}

impl TypedValue {
    /// The metric type matching this value's tag.
    pub fn kind(&self) -> MetricType {
        match self {
            Self::Int(_) => MetricType::Int,
            Self::Float(_) => MetricType::Float,
            Self::Duration(_) => MetricType::Duration,
            Self::Timestamp(_) => MetricType::TimestampWithTimezone,
            Self::Bool(_) => MetricType::Bool,
            Self::String(_) => MetricType::String,
        }
    }

    /// Canonical text form used for persistence.
    pub fn encode(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Duration(d) => humantime::format_duration(*d).to_string(),
            Self::Timestamp(ts) => ts.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::String(s) => s.clone(),
        }
    }

    /// Read stored text as the given declared type.
    pub fn decode(kind: MetricType, text: &str) -> Result<Self, CoercionError> {
        let err = |reason: &dyn fmt::Display| CoercionError::new(kind, text, reason);

        match kind {
            MetricType::Int => text.parse().map(Self::Int).map_err(|e| err(&e)),
            MetricType::Float => text.parse().map(Self::Float).map_err(|e| err(&e)),
            MetricType::Duration => humantime::parse_duration(text)
                .map(Self::Duration)
                .map_err(|e| err(&e)),
            MetricType::TimestampWithTimezone => Timestamp::parse(text)
                .map(Self::Timestamp)
                .map_err(|e| err(&e)),
            MetricType::Bool => text.parse().map(Self::Bool).map_err(|e| err(&e)),
            MetricType::String => Ok(Self::String(text.to_string())),
        }
    }

    /// Convert to the given declared type.
    ///
    /// A value already carrying the requested tag is returned as is; anything
    /// else goes through its text form, exactly as if it had been persisted
    /// and read back.
    pub fn coerce_to(&self, kind: MetricType) -> Result<Self, CoercionError> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        Self::decode(kind, &self.encode())
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<i64> for TypedValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for TypedValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Duration> for TypedValue {
    fn from(v: Duration) -> Self {
        Self::Duration(v)
    }
}

impl From<Timestamp> for TypedValue {
    fn from(v: Timestamp) -> Self {
        Self::Timestamp(v)
    }
}

impl From<bool> for TypedValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for TypedValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Duration(_) => serializer.collect_str(self),
            Self::Timestamp(ts) => ts.serialize(serializer),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::String(s) => serializer.serialize_str(s),
        }
    }
}

/// JSON integers become `Int`, other numbers `Float`, text stays `String`.
///
/// Durations and timestamps arrive as text and are read as such once the
/// metric's declared type is known.
impl<'de> Deserialize<'de> for TypedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TypedValueVisitor;

        impl Visitor<'_> for TypedValueVisitor {
            type Value = TypedValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number, boolean or string")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<TypedValue, E> {
                Ok(TypedValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<TypedValue, E> {
                Ok(TypedValue::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<TypedValue, E> {
                Ok(i64::try_from(v)
                    .map(TypedValue::Int)
                    .unwrap_or(TypedValue::Float(v as f64)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<TypedValue, E> {
                Ok(TypedValue::Float(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TypedValue, E> {
                Ok(TypedValue::String(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<TypedValue, E> {
                Ok(TypedValue::String(v))
            }
        }

        deserializer.deserialize_any(TypedValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    // =========================================================================
    // MetricType tests
    // =========================================================================

    #[test]
    fn test_metric_type_from_str_valid() {
        assert_eq!(MetricType::from_str("INT").unwrap(), MetricType::Int);
        assert_eq!(MetricType::from_str("FLOAT").unwrap(), MetricType::Float);
        assert_eq!(
            MetricType::from_str("DURATION").unwrap(),
            MetricType::Duration
        );
        assert_eq!(
            MetricType::from_str("TIMESTAMP_WITH_TIMEZONE").unwrap(),
            MetricType::TimestampWithTimezone
        );
        assert_eq!(MetricType::from_str("BOOL").unwrap(), MetricType::Bool);
        assert_eq!(MetricType::from_str("STRING").unwrap(), MetricType::String);
    }

    #[test]
    fn test_metric_type_from_str_is_exact() {
        assert!(MetricType::from_str("int").is_err());
        assert!(MetricType::from_str("TIMESTAMP").is_err());
        assert!(MetricType::from_str("DURATION_IN_NS").is_err());
        assert!(MetricType::from_str("").is_err());
    }

    #[test]
    fn test_metric_type_as_str() {
        assert_eq!(MetricType::TimestampWithTimezone.as_ref(), "TIMESTAMP_WITH_TIMEZONE");
        assert_eq!(MetricType::Bool.to_string(), "BOOL");
    }

    // =========================================================================
    // Encode / decode tests
    // =========================================================================

    #[test]
    fn test_decode_each_type() {
        assert_eq!(
            TypedValue::decode(MetricType::Int, "10").unwrap(),
            TypedValue::Int(10)
        );
        assert_eq!(
            TypedValue::decode(MetricType::Float, "56.7").unwrap(),
            TypedValue::Float(56.7)
        );
        assert_eq!(
            TypedValue::decode(MetricType::Duration, "10s").unwrap(),
            TypedValue::Duration(Duration::from_secs(10))
        );
        assert_eq!(
            TypedValue::decode(MetricType::TimestampWithTimezone, "2021-01-02T15:04:05+07:00")
                .unwrap(),
            TypedValue::Timestamp(Timestamp::parse("2021-01-02T08:04:05Z").unwrap())
        );
        assert_eq!(
            TypedValue::decode(MetricType::Bool, "true").unwrap(),
            TypedValue::Bool(true)
        );
        assert_eq!(
            TypedValue::decode(MetricType::String, "starting api server").unwrap(),
            TypedValue::String("starting api server".to_string())
        );
    }

    #[test]
    fn test_decode_failures() {
        let err = TypedValue::decode(MetricType::Int, "10.5").unwrap_err();
        assert_eq!(err.kind, MetricType::Int);
        assert_eq!(err.text, "10.5");

        assert!(TypedValue::decode(MetricType::Float, "fast").is_err());
        assert!(TypedValue::decode(MetricType::Duration, "10").is_err());
        assert!(TypedValue::decode(MetricType::TimestampWithTimezone, "today").is_err());
        assert!(TypedValue::decode(MetricType::Bool, "yes").is_err());
        assert!(TypedValue::decode(MetricType::Bool, "TRUE").is_err());
    }

    #[test]
    fn test_duration_canonical_form() {
        let value = TypedValue::decode(MetricType::Duration, "1h30m").unwrap();
        assert_eq!(value.encode(), "1h 30m");
        assert_eq!(TypedValue::Duration(Duration::from_secs(10)).encode(), "10s");
        assert_eq!(TypedValue::Duration(Duration::ZERO).encode(), "0s");
    }

    #[test]
    fn test_encode_decode_preserves_value() {
        let values = [
            TypedValue::Int(-42),
            TypedValue::Float(0.125),
            TypedValue::Duration(Duration::from_millis(1500)),
            TypedValue::Timestamp(Timestamp::now()),
            TypedValue::Bool(false),
            TypedValue::String("hello world".to_string()),
        ];

        for value in values {
            let decoded = TypedValue::decode(value.kind(), &value.encode()).unwrap();
            assert_eq!(decoded, value, "value {value:?} did not survive its text form");
        }
    }

    // =========================================================================
    // Coercion tests
    // =========================================================================

    #[test]
    fn test_coerce_same_kind_is_identity() {
        let value = TypedValue::Float(1.5);
        assert_eq!(value.coerce_to(MetricType::Float).unwrap(), value);
    }

    #[test]
    fn test_coerce_string_to_declared_type() {
        assert_eq!(
            TypedValue::from("10s")
                .coerce_to(MetricType::Duration)
                .unwrap(),
            TypedValue::Duration(Duration::from_secs(10))
        );
        assert_eq!(
            TypedValue::from("2021-01-02T15:04:05Z")
                .coerce_to(MetricType::TimestampWithTimezone)
                .unwrap()
                .encode(),
            "2021-01-02T15:04:05Z"
        );
    }

    #[test]
    fn test_coerce_int_to_float() {
        assert_eq!(
            TypedValue::Int(10).coerce_to(MetricType::Float).unwrap(),
            TypedValue::Float(10.0)
        );
    }

    #[test]
    fn test_coerce_mismatch_fails() {
        assert!(TypedValue::Bool(true).coerce_to(MetricType::Int).is_err());
        assert!(TypedValue::Float(1.5).coerce_to(MetricType::Int).is_err());
    }

    #[test]
    fn test_coerce_anything_to_string() {
        assert_eq!(
            TypedValue::Int(7).coerce_to(MetricType::String).unwrap(),
            TypedValue::String("7".to_string())
        );
    }

    // =========================================================================
    // JSON tests
    // =========================================================================

    #[test]
    fn test_json_deserialize_tags() {
        let v: TypedValue = serde_json::from_value(json!(10)).unwrap();
        assert_eq!(v, TypedValue::Int(10));
        let v: TypedValue = serde_json::from_value(json!(56.7)).unwrap();
        assert_eq!(v, TypedValue::Float(56.7));
        let v: TypedValue = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(v, TypedValue::Bool(true));
        let v: TypedValue = serde_json::from_value(json!("10s")).unwrap();
        assert_eq!(v, TypedValue::String("10s".to_string()));
        assert!(serde_json::from_value::<TypedValue>(json!(null)).is_err());
        assert!(serde_json::from_value::<TypedValue>(json!([1, 2])).is_err());
    }

    #[test]
    fn test_json_serialize() {
        assert_eq!(
            serde_json::to_value(TypedValue::Duration(Duration::from_secs(10))).unwrap(),
            json!("10s")
        );
        assert_eq!(serde_json::to_value(TypedValue::Int(3)).unwrap(), json!(3));
        assert_eq!(
            serde_json::to_value(TypedValue::Timestamp(
                Timestamp::parse("2021-01-02T15:04:05Z").unwrap()
            ))
            .unwrap(),
            json!("2021-01-02T15:04:05Z")
        );
    }
}

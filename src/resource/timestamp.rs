//! Server timestamps
//!
//! The service reports `created_at`/`updated_at` as UNIX seconds (integer
//! or float, occasionally as a string). They are displayed as ISO-8601 in
//! UTC, or `--` when absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Shown in place of a missing timestamp
pub const PLACEHOLDER: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn from_unix(secs: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp(secs, 0).map(Self)
    }

    /// Interpret a JSON value; `null`, `0`, `""` and unparsable values are absent
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))?;
                Self::positive(secs)
            },
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(secs) = text.parse::<i64>() {
            return Self::positive(secs);
        }
        if let Ok(secs) = text.parse::<f64>() {
            return Self::positive(secs.trunc() as i64);
        }
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| Self(dt.with_timezone(&Utc)))
    }

    fn positive(secs: i64) -> Option<Self> {
        if secs <= 0 {
            return None;
        }
        Self::from_unix(secs)
    }

    pub fn unix(&self) -> i64 {
        self.0.timestamp()
    }

    /// ISO-8601, second precision, `Z` suffix
    pub fn iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iso8601())
    }
}

/// Display form of an optional timestamp
pub fn render(timestamp: Option<Timestamp>) -> String {
    timestamp
        .map(|t| t.iso8601())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.unix())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {value}")))
    }
}

/// `deserialize_with` helper: absent or unusable values become `None`
pub fn lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Timestamp>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Timestamp::from_value))
}

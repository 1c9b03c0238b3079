//! Wire schema of the payload line exchanged between extractor, publisher and
//! the home-automation consumer.
//!
//! ```text
//! {"generator":{"runtime_hours":27.6,"battery_voltage":13.8,
//!   "last_exercise_date":"2026-02-03T15:08:00+00:00",
//!   "last_updated":"2026-02-09T03:00:34-05:00"}}
//! ```
//!
//! Both timestamps carry an explicit offset. Naive timestamps are rejected on
//! the way in.

use crate::error::PayloadError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Top-level envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorPayload {
    pub generator: GeneratorReading,
}

/// Field order here is the field order on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorReading {
    pub runtime_hours: f64,
    pub battery_voltage: f64,
    #[serde(with = "offset_timestamp")]
    pub last_exercise_date: DateTime<FixedOffset>,
    #[serde(with = "offset_timestamp")]
    pub last_updated: DateTime<FixedOffset>,
}

impl GeneratorPayload {
    /// Compact single-line JSON.
    pub fn to_line(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse one payload line. Surrounding whitespace is ignored; embedded
    /// line breaks are not.
    pub fn from_line(line: &str) -> Result<Self, PayloadError> {
        let line = line.trim();
        if line.contains('\n') || line.contains('\r') {
            return Err(PayloadError::Multiline);
        }
        Ok(serde_json::from_str(line)?)
    }
}

/// RFC 3339 with a numeric offset (`+00:00`, never `Z`) and only as much
/// sub-second precision as the value has.
pub mod offset_timestamp {
    use chrono::{DateTime, FixedOffset, SecondsFormat};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn format(at: &DateTime<FixedOffset>) -> String {
        at.to_rfc3339_opts(SecondsFormat::AutoSi, false)
    }

    pub fn serialize<S>(at: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(at))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw).map_err(|e| {
            de::Error::custom(format_args!(
                "{raw:?} is not an offset-aware RFC 3339 timestamp: {e}"
            ))
        })
    }
}

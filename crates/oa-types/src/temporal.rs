use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::error::TypeError;

/// UTC wall-clock instant used for every timestamp field.
pub type Timestamp = DateTime<Utc>;

/// Current time truncated to whole seconds.
pub fn now() -> Timestamp {
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}

/// Parse an ISO 8601 date-time, normalising the offset to UTC.
///
/// Values without a zone (`2024-01-01T00:00:00`, optionally with fractional
/// seconds) are taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<Timestamp, TypeError> {
    let trimmed = value.trim();
    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(e) => trimmed
            .parse::<NaiveDateTime>()
            .map(|naive| naive.and_utc())
            .map_err(|_| TypeError::InvalidTimestamp {
                value: value.to_string(),
                reason: e.to_string(),
            }),
    }
}

/// Render as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Deserializers for timestamp fields that go through [`parse_timestamp`].
///
/// Use with `#[serde(deserialize_with = "...")]`; serialization stays on
/// chrono's RFC 3339 output.
pub mod serde_utc {
    use serde::{Deserialize, Deserializer};

    use super::{parse_timestamp, Timestamp};

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(de)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer};

        use super::super::{parse_timestamp, Timestamp};

        pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Timestamp>, D::Error> {
            match Option::<String>::deserialize(de)? {
                Some(raw) => parse_timestamp(&raw).map(Some).map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}

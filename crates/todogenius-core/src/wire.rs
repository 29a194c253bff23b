//! Serde helpers for the loosely typed fields the API sends: dates that may
//! arrive as `YYYY-MM-DD` or as full timestamps, and strings that may be null.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use tracing::warn;

/// Parse a timestamp, keeping the offset the server wrote. Naive timestamps
/// and bare dates are taken as UTC.
pub(crate) fn parse_datetime_offset(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

pub(crate) fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    parse_datetime_offset(raw).map(|dt| dt.with_timezone(&Utc))
}

/// The calendar day as written, in the timestamp's own offset.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime_offset(raw).map(|dt| dt.date_naive()))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

pub(crate) mod opt_datetime {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => s.serialize_str(&dt.to_rfc3339()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match blank_to_none(Option::<String>::deserialize(d)?) {
            None => Ok(None),
            Some(s) => parse_datetime(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {s}"))),
        }
    }
}

/// Like [`opt_datetime`] but keeps the sender's offset, so the calendar day
/// survives a round trip.
pub(crate) mod opt_datetime_offset {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<FixedOffset>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => s.serialize_str(&dt.to_rfc3339()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
        match blank_to_none(Option::<String>::deserialize(d)?) {
            None => Ok(None),
            Some(s) => parse_datetime_offset(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {s}"))),
        }
    }
}

pub(crate) mod opt_date {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match blank_to_none(Option::<String>::deserialize(d)?) {
            None => Ok(None),
            Some(s) => parse_date(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s}"))),
        }
    }
}

/// For model output: an unreadable date becomes `None` instead of failing
/// the whole payload.
pub(crate) mod lenient_opt_date {
    use super::*;

    pub use super::opt_date::serialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = match Option::<Raw>::deserialize(d)? {
            None => return Ok(None),
            Some(Raw::Text(s)) if s.trim().is_empty() => return Ok(None),
            Some(Raw::Text(s)) => s,
            Some(Raw::Other(_)) => {
                warn!("ignoring non-text suggested deadline");
                return Ok(None);
            }
        };
        let parsed = parse_date(&raw);
        if parsed.is_none() {
            warn!(value = %raw, "ignoring unreadable suggested deadline");
        }
        Ok(parsed)
    }
}

pub(crate) fn nullable_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

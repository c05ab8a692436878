use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{Result, TrackerError};

/// Tri-state slot for a single wire field.
///
/// `Absent` means the field was never observed or set. `Empty` means the
/// field exists but carries no content (`null` or an empty string on the
/// wire). `Value` holds concrete content. Absent fields are omitted
/// entirely when serializing an update, which is what lets a
/// partially-populated record describe a patch without clobbering
/// server-side state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldState<T> {
    #[default]
    Absent,
    Empty,
    Value(T),
}

impl<T> FieldState<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldState::Absent)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldState::Empty)
    }

    /// The concrete value, if this field holds one.
    pub fn value(&self) -> Option<&T> {
        match self {
            FieldState::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> FieldState<&T> {
        match self {
            FieldState::Absent => FieldState::Absent,
            FieldState::Empty => FieldState::Empty,
            FieldState::Value(v) => FieldState::Value(v),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldState<U> {
        match self {
            FieldState::Absent => FieldState::Absent,
            FieldState::Empty => FieldState::Empty,
            FieldState::Value(v) => FieldState::Value(f(v)),
        }
    }
}

/// Read a raw member from a decoded wire object.
///
/// A missing key is `Absent`, a normal outcome rather than an error. A
/// member that is `null` or an empty string is `Empty`. Everything else is
/// a value; in particular numeric zero and `false` are values.
pub fn read_field<'a>(obj: &'a Map<String, Value>, key: &str) -> FieldState<&'a Value> {
    match obj.get(key) {
        None => FieldState::Absent,
        Some(Value::Null) => FieldState::Empty,
        Some(Value::String(s)) if s.is_empty() => FieldState::Empty,
        Some(v) => FieldState::Value(v),
    }
}

/// Read a string member. Scalar non-strings are accepted and stringified;
/// arrays and objects are a parse error.
pub fn read_string(obj: &Map<String, Value>, key: &str) -> Result<FieldState<String>> {
    match read_field(obj, key) {
        FieldState::Absent => Ok(FieldState::Absent),
        FieldState::Empty => Ok(FieldState::Empty),
        FieldState::Value(Value::String(s)) => Ok(FieldState::Value(s.clone())),
        FieldState::Value(Value::Number(n)) => Ok(FieldState::Value(n.to_string())),
        FieldState::Value(Value::Bool(b)) => Ok(FieldState::Value(b.to_string())),
        FieldState::Value(other) => Err(TrackerError::parse(format!(
            "field '{key}' is not a scalar: {other}"
        ))),
    }
}

/// Read an unsigned integer member, accepted as a JSON number or a numeric
/// string.
pub fn read_u64(obj: &Map<String, Value>, key: &str) -> Result<FieldState<u64>> {
    match read_field(obj, key) {
        FieldState::Absent => Ok(FieldState::Absent),
        FieldState::Empty => Ok(FieldState::Empty),
        FieldState::Value(v) => {
            let parsed = match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            };
            parsed.map(FieldState::Value).ok_or_else(|| {
                TrackerError::parse(format!("field '{key}' is not an unsigned integer: {v}"))
            })
        }
    }
}

/// Read a signed integer member, accepted as a JSON number or a numeric
/// string.
pub fn read_i64(obj: &Map<String, Value>, key: &str) -> Result<FieldState<i64>> {
    match read_field(obj, key) {
        FieldState::Absent => Ok(FieldState::Absent),
        FieldState::Empty => Ok(FieldState::Empty),
        FieldState::Value(v) => {
            let parsed = match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            };
            parsed.map(FieldState::Value).ok_or_else(|| {
                TrackerError::parse(format!("field '{key}' is not an integer: {v}"))
            })
        }
    }
}

/// Read a datetime member and parse it into epoch seconds.
///
/// A present-but-empty datetime is indistinguishable from an unset one on
/// this wire format, so it collapses to `Absent`.
pub fn read_timestamp(obj: &Map<String, Value>, key: &str) -> Result<FieldState<i64>> {
    match read_field(obj, key) {
        FieldState::Absent | FieldState::Empty => Ok(FieldState::Absent),
        FieldState::Value(Value::String(s)) => parse_timestamp(s),
        FieldState::Value(other) => Err(TrackerError::parse(format!(
            "field '{key}' is not a datetime string: {other}"
        ))),
    }
}

/// Parse one of the service's datetime strings into seconds since the Unix
/// epoch.
///
/// Two shapes are accepted, depending on API generation:
/// `YYYY/MM/DD HH:MM:SS ZZZ` and `YYYY-MM-DDTHH:MM:SS` followed by a short
/// zone suffix. The zone letters are ignored either way; the service writes
/// GMT and UTC interchangeably and both name UTC, so the calendar fields
/// are taken as UTC wall-clock time. Empty input is `Absent`. A string
/// matching neither shape is a hard error, never swallowed.
pub fn parse_timestamp(raw: &str) -> Result<FieldState<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(FieldState::Absent);
    }

    if let Some((stamp, zone)) = raw.rsplit_once(' ') {
        if is_zone_suffix(zone) {
            if let Ok(dt) = NaiveDateTime::parse_from_str(stamp, "%Y/%m/%d %H:%M:%S") {
                return Ok(FieldState::Value(dt.and_utc().timestamp()));
            }
        }
    }

    // ISO-like shape: 19 datetime characters, then the zone suffix.
    if raw.is_char_boundary(19) && raw.len() > 19 {
        let (stamp, zone) = raw.split_at(19);
        if is_zone_suffix(zone.trim_start()) {
            if let Ok(dt) = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S") {
                return Ok(FieldState::Value(dt.and_utc().timestamp()));
            }
        }
    }

    Err(TrackerError::parse(format!(
        "unrecognized datetime string: {raw:?}"
    )))
}

fn is_zone_suffix(zone: &str) -> bool {
    (2..=4).contains(&zone.len()) && zone.chars().all(|c| c.is_ascii_alphabetic())
}

/// Render epoch seconds in the canonical wire datetime shape.
///
/// Always UTC with the literal `UTC` marker, zero-padded, 24-hour clock,
/// regardless of which ingestion shape was originally observed.
pub fn format_timestamp(secs: i64) -> Result<String> {
    let dt: DateTime<Utc> = DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| TrackerError::parse(format!("epoch seconds out of range: {secs}")))?;
    Ok(format!("{} UTC", dt.format("%Y/%m/%d %H:%M:%S")))
}

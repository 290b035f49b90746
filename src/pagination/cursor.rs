//! # Cursor Codec
//!
//! Turns the raw `after` / `after_uuid` / `limit` query parameters into a
//! [`PageRequest`]. Parsing never fails: an unreadable timestamp falls back to
//! the epoch and an unreadable uuid to the nil uuid, so a bad cursor restarts
//! pagination from the beginning instead of rejecting the request.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PaginationConfig;

/// Datetime layouts with an explicit offset, tried after RFC 3339 / RFC 2822.
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Datetime layouts without an offset; interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
];

/// Date-only layouts; interpreted as midnight UTC.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%b %d, %Y",
];

/// Exclusive lower bound of a page under the `(created_at, uuid)` ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Cursor {
    pub after: DateTime<Utc>,
    pub after_uuid: Uuid,
}

impl Cursor {
    pub fn new(after: DateTime<Utc>, after_uuid: Uuid) -> Self {
        Self { after, after_uuid }
    }

    /// The cursor preceding every row: `(epoch, nil uuid)`.
    pub fn origin() -> Self {
        Self {
            after: DateTime::<Utc>::UNIX_EPOCH,
            after_uuid: Uuid::nil(),
        }
    }

    /// Builds the cursor identifying a stored row.
    pub fn from_row(created_at: &DateTimeWithTimeZone, uuid: Uuid) -> Self {
        Self {
            after: created_at.with_timezone(&Utc),
            after_uuid: uuid,
        }
    }

    /// The timestamp in the column type used by the entity store.
    pub fn after_db(&self) -> DateTimeWithTimeZone {
        self.after.fixed_offset()
    }

    /// Renders `after=<unix seconds>.<micros>&after_uuid=<uuid>` for links.
    pub fn to_query(&self) -> String {
        format!(
            "after={}&after_uuid={}",
            format_timestamp(&self.after),
            self.after_uuid
        )
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::origin()
    }
}

/// Raw pagination parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub after: Option<String>,
    pub after_uuid: Option<String>,
    pub limit: Option<u64>,
}

/// A decoded cursor plus the clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: Cursor,
    pub limit: u64,
}

impl PageRequest {
    pub fn from_query(query: &PaginationQuery, bounds: &PaginationConfig) -> Self {
        Self {
            cursor: Cursor::new(
                parse_after(query.after.as_deref()),
                parse_after_uuid(query.after_uuid.as_deref()),
            ),
            limit: clamp_limit(query.limit, bounds),
        }
    }
}

/// Unix seconds with microsecond precision, e.g. `1514764800.250000`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    format!("{}.{:06}", ts.timestamp(), ts.timestamp_subsec_micros())
}

/// Parses the `after` parameter.
///
/// All-numeric input (digits and at most one `.`) is a Unix timestamp in
/// seconds; anything else goes through the date/time layouts above. Input
/// that matches nothing yields the epoch.
pub fn parse_after(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return DateTime::<Utc>::UNIX_EPOCH;
    };

    let parsed = if is_numeric(raw) {
        parse_unix_timestamp(raw)
    } else {
        parse_datetime(raw)
    };

    parsed.unwrap_or_else(|| {
        tracing::debug!(after = raw, "Unparseable cursor timestamp, using epoch");
        DateTime::<Utc>::UNIX_EPOCH
    })
}

/// Parses the `after_uuid` parameter, falling back to the nil uuid.
pub fn parse_after_uuid(raw: Option<&str>) -> Uuid {
    raw.map(str::trim)
        .and_then(|v| Uuid::parse_str(v).ok())
        .unwrap_or_else(Uuid::nil)
}

/// `min(requested or default, max)`, never below one.
pub fn clamp_limit(requested: Option<u64>, bounds: &PaginationConfig) -> u64 {
    requested
        .unwrap_or(bounds.default_page_limit)
        .min(bounds.max_page_limit)
        .max(1)
}

fn is_numeric(raw: &str) -> bool {
    raw.chars().all(|c| c.is_ascii_digit() || c == '.')
        && raw.matches('.').count() <= 1
        && raw.chars().any(|c| c.is_ascii_digit())
}

// Splits on the dot instead of going through f64 so that microsecond
// cursors emitted by `format_timestamp` round-trip exactly.
fn parse_unix_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = raw.split_once('.').unwrap_or((raw, ""));
    let secs: i64 = if secs.is_empty() { 0 } else { secs.parse().ok()? };
    let nanos: u32 = if frac.is_empty() {
        0
    } else {
        let digits: String = frac.chars().take(9).collect();
        format!("{:0<9}", digits).parse().ok()?
    };
    DateTime::from_timestamp(secs, nanos)
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(naive.and_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

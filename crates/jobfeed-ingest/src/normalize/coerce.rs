// Per-cell type coercion. Values that cannot be converted become null.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::table::Cell;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Coerce a cell to a number: integers where possible, else finite floats.
pub fn to_numeric(cell: &Cell) -> Cell {
    match cell {
        Cell::Integer(i) => Cell::Integer(*i),
        Cell::Float(f) if f.is_finite() => Cell::Float(*f),
        Cell::Bool(b) => Cell::Integer(i64::from(*b)),
        Cell::Text(s) => parse_numeric(s),
        Cell::Float(_) | Cell::Timestamp(_) | Cell::Null => Cell::Null,
    }
}

fn parse_numeric(raw: &str) -> Cell {
    let s = raw.trim();
    if s.is_empty() {
        return Cell::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Cell::Integer(i);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => Cell::Float(f),
        _ => Cell::Null,
    }
}

/// Coerce a cell to a zone-less timestamp.
///
/// Strings lose any trailing zone suffix before parsing and keep their
/// wall-clock time. Integers are Unix epoch milliseconds.
pub fn to_timestamp(cell: &Cell) -> Cell {
    let parsed = match cell {
        Cell::Timestamp(ts) => Some(*ts),
        Cell::Text(s) => parse_timestamp(s),
        Cell::Integer(millis) => DateTime::from_timestamp_millis(*millis).map(|dt| dt.naive_utc()),
        Cell::Null | Cell::Bool(_) | Cell::Float(_) => None,
    };
    parsed.map(Cell::Timestamp).unwrap_or(Cell::Null)
}

/// Parse a timestamp string after dropping its zone suffix
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = strip_zone_suffix(raw.trim());

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Drop a trailing `Z`, `+HH:MM`, `+HHMM`, `+HH` or the `-` equivalents.
///
/// Only a suffix that follows the time part is treated as an offset, so the
/// dashes of a bare date are left alone.
pub fn strip_zone_suffix(s: &str) -> &str {
    if let Some(prefix) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        return prefix;
    }

    let Some(time_start) = s.find(['T', ' ']) else {
        return s;
    };

    match s.rfind(['+', '-']) {
        Some(pos) if pos > time_start && is_offset(&s[pos + 1..]) => &s[..pos],
        _ => s,
    }
}

fn is_offset(s: &str) -> bool {
    let b = s.as_bytes();
    let digits = |part: &[u8]| part.iter().all(u8::is_ascii_digit);
    match b.len() {
        2 | 4 => digits(b),
        5 => digits(&b[..2]) && b[2] == b':' && digits(&b[3..]),
        _ => false,
    }
}

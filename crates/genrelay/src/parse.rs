//! Turn loosely formatted dashboard text into typed values.
//!
//! Every parser here fails rather than guesses: a reading that cannot be
//! read is never replaced by zero or "now".

use crate::error::ParseError;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Display formats tried in order, after [`normalize_display_timestamp`].
/// `%B` matches full and abbreviated month names alike.
const DISPLAY_FORMATS: &[&str] = &[
    "%B %d %Y %I:%M %p",
    "%B %d %Y %I:%M:%S %p",
    "%B %d %Y %H:%M",
    "%B %d %Y %H:%M:%S",
    "%d %B %Y %I:%M %p",
    "%d %B %Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Words that carry no date information in display text.
const FILLER_WORDS: &[&str] = &[
    "mon", "monday", "tue", "tues", "tuesday", "wed", "wednesday", "thu", "thur", "thurs",
    "thursday", "fri", "friday", "sat", "saturday", "sun", "sunday", "at", "on",
];

fn runtime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:^|\s)(\d[\d,]*(?:\.\d+)?)\s*(?:hours?|hrs?)\b").expect("runtime regex is valid"))
}

fn bare_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d[\d,]*(?:\.\d+)?$").expect("bare number regex is valid"))
}

fn voltage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.\d+").expect("voltage regex is valid"))
}

fn ordinal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("ordinal regex is valid"))
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}").expect("year regex is valid"))
}

/// Read runtime hours from text such as `"27.6 Hours"` or `"1,204 hrs"`.
///
/// A bare number (`"27.6"`) is accepted as well.
pub fn parse_runtime_hours(text: &str) -> Result<f64, ParseError> {
    let text = text.trim();
    let raw = runtime_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .or_else(|| {
            text.split_whitespace()
                .next()
                .filter(|tok| bare_number_re().is_match(tok))
        })
        .ok_or_else(|| ParseError::NotNumeric {
            field: "runtime_hours",
            text: text.to_string(),
        })?;

    let value = to_number("runtime_hours", raw, text)?;
    if value < 0.0 {
        return Err(ParseError::OutOfRange {
            field: "runtime_hours",
            value,
        });
    }
    Ok(value)
}

/// Read the first decimal reading (`\d+.\d+`) from the text around the
/// battery label, e.g. `"Battery Voltage (V)\n13.8"`.
pub fn parse_battery_voltage(text: &str) -> Result<f64, ParseError> {
    let raw = voltage_re()
        .find(text)
        .map(|m| m.as_str())
        .ok_or_else(|| ParseError::NotNumeric {
            field: "battery_voltage",
            text: text.trim().to_string(),
        })?;
    to_number("battery_voltage", raw, text)
}

fn to_number(field: &'static str, raw: &str, text: &str) -> Result<f64, ParseError> {
    let value: f64 = raw
        .replace(',', "")
        .parse()
        .map_err(|_| ParseError::NotNumeric {
            field,
            text: text.trim().to_string(),
        })?;
    if !value.is_finite() {
        return Err(ParseError::OutOfRange { field, value });
    }
    Ok(value)
}

/// True when the text at least carries a four-digit year.
pub fn looks_like_date(text: &str) -> bool {
    year_re().is_match(text)
}

/// Strip weekday names, ordinal suffixes, commas and filler words so the
/// remainder fits one of the strict display formats.
///
/// `"Tue, Feb 3rd, 2026 3:08 PM"` becomes `"Feb 3 2026 3:08 PM"`.
pub fn normalize_display_timestamp(text: &str) -> String {
    let without_ordinals = ordinal_re().replace_all(text, "$1");
    without_ordinals
        .replace(',', " ")
        .split_whitespace()
        .filter(|tok| {
            let lower = tok.trim_end_matches('.').to_ascii_lowercase();
            !FILLER_WORDS.contains(&lower.as_str())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a dashboard date/time and pin it to UTC.
///
/// The portal shows wall-clock time without a zone; it is read as UTC so the
/// result is an unambiguous instant.
pub fn parse_display_timestamp(text: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    parse_display_timestamp_at(text, Utc.fix())
}

/// Parse a dashboard date/time as wall-clock time at `offset`.
pub fn parse_display_timestamp_at(
    text: &str,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, ParseError> {
    let cleaned = normalize_display_timestamp(text);
    let naive = DISPLAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&cleaned, fmt).ok())
        .ok_or_else(|| ParseError::Timestamp {
            text: text.trim().to_string(),
        })?;

    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| ParseError::Timestamp {
            text: text.trim().to_string(),
        })
}

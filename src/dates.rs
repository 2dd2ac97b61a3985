use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use regex::Regex;

// Two-digit-year layouts go first: `%Y` would happily read "24" as year 24.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y", "%d-%m-%y", "%d.%m.%y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d",
];

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

// Larger serials would land past year 9999.
const MAX_SERIAL: i64 = 2_958_465;

fn serial_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.0+)?$").expect("static regex"))
}

/// Spreadsheet day serial to a calendar date.
pub fn excel_serial_to_date(serial: i64) -> Option<NaiveDate> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    if !(0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    base.checked_add_signed(TimeDelta::try_days(serial)?)
}

/// Parse a ledger date cell. Textual dates are read day-first; an all-digit
/// cell (optionally with a `.0` tail) is a spreadsheet serial.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    if serial_shape().is_match(raw) {
        let days = raw.split('.').next()?.parse::<i64>().ok()?;
        return excel_serial_to_date(days);
    }
    None
}

/// Stored/display form: `DD/MM/YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

//! Booking date parsing.
//!
//! The booking app sends day-first dates (`DD/MM/YYYY`) and appointment
//! timestamps (`DD/MM/YYYY HH:MM:SS`) without any offset. Appointments are
//! wall-clock times in the configured booking zone.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::{Error, Result};

const DAY_FORMAT: &str = "%d/%m/%Y";
const APPOINTMENT_FORMATS: [&str; 2] = ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];

/// Parse a `DD/MM/YYYY` booking date.
pub fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DAY_FORMAT)
        .map_err(|e| Error::DateFormatInvalid(format!("'{}': {}", value, e)))
}

/// Parse a `DD/MM/YYYY HH:MM:SS` appointment timestamp (seconds optional).
pub fn parse_appointment(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    APPOINTMENT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| {
            Error::DateFormatInvalid(format!("'{}' is not DD/MM/YYYY HH:MM:SS", value))
        })
}

/// Pin a wall-clock time to `tz`. Ambiguous times take the earlier instant.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(instant) => Ok(instant),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(Error::DateFormatInvalid(format!(
            "{} does not exist in {}",
            naive,
            tz.name()
        ))),
    }
}

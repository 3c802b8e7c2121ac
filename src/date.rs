//! Compact stamp dates: `YYMMDD`, `YYMMDDHHMM` or `YYMMDDHHMMSS`, always UTC.
//!
//! The two-digit year is read as `2000 + YY`; years outside 2000..=2099 cannot
//! be written.
use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Timelike, Utc};

use crate::error::{Error, Result};

/// Format `date` with the shortest precision that loses nothing at second resolution.
pub fn format_date(date: &DateTime<Utc>) -> String {
    if date.hour() == 0 && date.minute() == 0 && date.second() == 0 {
        date.format("%y%m%d").to_string()
    } else if date.second() == 0 {
        date.format("%y%m%d%H%M").to_string()
    } else {
        date.format("%y%m%d%H%M%S").to_string()
    }
}

/// Parse the date field of a stamp.
///
/// Components are read at fixed offsets; a missing or short component counts
/// as zero, so `060408` and `0604080000` name the same instant. A day past
/// the end of its month (up to 31) rolls into the next month: `060230` is
/// 2006-03-02.
pub fn parse_date(field: &str) -> Result<DateTime<Utc>> {
    let year = 2000 + component(field, 0);
    let month = component(field, 2);
    let day = component(field, 4);
    let hour = component(field, 6);
    let minute = component(field, 8);
    let second = component(field, 10);

    let date = match day {
        1..=31 => NaiveDate::from_ymd_opt(year as i32, month, 1)
            .and_then(|first| first.checked_add_days(Days::new(u64::from(day) - 1))),
        _ => None,
    };
    date.and_then(|d| d.and_hms_opt(hour, minute, second))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| Error::Format(format!("invalid date {field:?}")))
}

/// Whether `date` survives a format/parse cycle (second precision, 2000..=2099).
pub fn is_representable(date: &DateTime<Utc>) -> bool {
    (2000..2100).contains(&date.year()) && date.nanosecond() == 0
}

/// Two characters starting at `offset`, parsed leniently.
fn component(field: &str, offset: usize) -> u32 {
    let end = field.len().min(offset + 2);
    field.get(offset..end).map(leading_digits).unwrap_or(0)
}

/// Value of the leading decimal digits of `s`, zero if there are none.
pub(crate) fn leading_digits(s: &str) -> u32 {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    s[..digits].parse().unwrap_or(0)
}

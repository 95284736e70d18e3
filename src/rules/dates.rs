//! Date decoding for rule chains
//!
//! Rule-set files declare date formats with the pattern tokens the original
//! crawler configs used (`dd.MM.yyyy`, `HH:mm`, ...). This module converts
//! those patterns to strftime form and decodes both calendar dates and
//! relative "N days/hours/minutes ago" values.

use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDateTime, NaiveTime};

/// Pattern-token form of the default output format `dd.MM.yyyy`.
pub const DEFAULT_OUT_PATTERN: &str = "dd.MM.yyyy";

/// Unit for relative date values ("posted 2 days ago" style markers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeUnit {
    Days,
    Hours,
    Minutes,
}

impl RelativeUnit {
    /// Maps the single-letter in-format markers to a relative unit.
    pub fn from_format(format: &str) -> Option<RelativeUnit> {
        match format {
            "d" => Some(RelativeUnit::Days),
            "H" => Some(RelativeUnit::Hours),
            "m" => Some(RelativeUnit::Minutes),
            _ => None,
        }
    }
}

/// Converts a date pattern in config-token form to a strftime format string.
///
/// Recognized tokens: `yyyy`/`yy`, `MMMM`/`MMM`/`MM`/`M`, `dd`/`d`,
/// `HH`/`H`, `hh`/`h`, `mm`/`m`, `ss`/`s`, `EEEE`/`EEE`, `a`. Everything
/// else passes through literally.
pub fn convert_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_alphabetic() {
            let mut run = 1;
            while i + run < chars.len() && chars[i + run] == c {
                run += 1;
            }
            match (c, run) {
                ('y', 1..=2) => out.push_str("%y"),
                ('y', _) => out.push_str("%Y"),
                ('M', 3) => out.push_str("%b"),
                ('M', r) if r >= 4 => out.push_str("%B"),
                ('M', _) => out.push_str("%m"),
                ('d', _) => out.push_str("%d"),
                ('H', _) => out.push_str("%H"),
                ('h', _) => out.push_str("%I"),
                ('m', _) => out.push_str("%M"),
                ('s', _) => out.push_str("%S"),
                ('E', r) if r >= 4 => out.push_str("%A"),
                ('E', _) => out.push_str("%a"),
                ('a', _) => out.push_str("%p"),
                _ => out.extend(std::iter::repeat(c).take(run)),
            }
            i += run;
        } else {
            if c == '%' {
                out.push('%');
            }
            out.push(c);
            i += 1;
        }
    }

    out
}

/// Whether a pattern in config-token form carries a year token.
pub fn pattern_has_year(pattern: &str) -> bool {
    pattern.contains('y')
}

/// Decodes a relative date value: `now` minus `value` units.
pub fn decode_relative(
    value: &str,
    unit: RelativeUnit,
    now: DateTime<Local>,
) -> Option<NaiveDateTime> {
    let count: i64 = value.trim().parse().ok()?;
    let delta = match unit {
        RelativeUnit::Days => Duration::try_days(count),
        RelativeUnit::Hours => Duration::try_hours(count),
        RelativeUnit::Minutes => Duration::try_minutes(count),
    }?;
    now.checked_sub_signed(delta).map(|dt| dt.naive_local())
}

/// Parses a calendar date value with a strftime format.
///
/// When the format carries no year the parsed date is forced into the
/// current year, matching how listing pages print dates like "24.12.".
/// Missing time components default to midnight.
pub fn decode_calendar(
    value: &str,
    strftime: &str,
    has_year: bool,
    now: DateTime<Local>,
) -> Option<NaiveDateTime> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, value.trim(), StrftimeItems::new(strftime)).ok()?;
    if !has_year {
        parsed.set_year(i64::from(now.year())).ok()?;
    }
    let date = parsed.to_naive_date().ok()?;
    let time = parsed.to_naive_time().unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time))
}

/// Formats a date with a strftime format, or `None` if the format string
/// is not formattable.
pub fn format_date(date: NaiveDateTime, strftime: &str) -> Option<String> {
    use std::fmt::Write;
    let mut out = String::new();
    write!(out, "{}", date.format(strftime)).ok()?;
    Some(out)
}

/// Parses a date string in config-token pattern form (convenience for the
/// pagination classifier, which compares extracted dates to fetch times).
pub fn parse_with_pattern(value: &str, pattern: &str, now: DateTime<Local>) -> Option<NaiveDateTime> {
    let strftime = convert_pattern(pattern);
    decode_calendar(value, &strftime, pattern_has_year(pattern), now)
}

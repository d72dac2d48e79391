//! Date handling for Drexel crime logs.
//!
//! Three formats show up in a log:
//! - the page header range, `From Jan 13, 2016 to Jan 13, 2017.`
//! - a single timestamp, `10/14/17 - FRI at 09:00`
//! - an occurred range, two timestamps joined by ` - `

use chrono::{Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

use super::error::UnitError;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Two digit years in a log are offset from this century.
const CENTURY: i32 = 2000;

/// Compiled patterns for the crime log layout. Each consumer owns its own
/// copy, built once at construction.
#[derive(Debug, Clone)]
pub struct LogPatterns {
    header_range: Regex,
    timestamp: Regex,
    occurred_range: Regex,
    page_number: Regex,
}

impl LogPatterns {
    pub fn new() -> Self {
        Self {
            header_range: Regex::new(
                r"^From ([A-Z][a-z]+) ([0-9]{1,2}), ([0-9]{4}) to ([A-Z][a-z]+) ([0-9]{1,2}), ([0-9]{4})\.$",
            )
            .expect("header range pattern"),
            timestamp: Regex::new(
                r"^([0-9]{2})/([0-9]{2})/([0-9]{2}) - [A-Z]+ at ([0-9]{2}):([0-9]{2})$",
            )
            .expect("timestamp pattern"),
            occurred_range: Regex::new(r"^(.*[0-9]) - ([0-9].*)$").expect("occurred range pattern"),
            page_number: Regex::new(r"^[0-9]+$").expect("page number pattern"),
        }
    }

    /// True for the first line of a page header.
    pub fn is_header_range(&self, field: &str) -> bool {
        self.header_range.is_match(field)
    }

    /// True for the first line of a page footer. Matches the raw field, so
    /// padded numbers such as the listed-incident count are not footers.
    pub fn is_page_number(&self, field: &str) -> bool {
        self.page_number.is_match(field)
    }

    /// Parse a page header range. Returns `None` when the field is not a
    /// header at all.
    pub fn parse_header_range(
        &self,
        field: &str,
    ) -> Option<Result<(NaiveDate, NaiveDate), UnitError>> {
        let caps = self.header_range.captures(field)?;
        let parse = || -> Result<(NaiveDate, NaiveDate), UnitError> {
            let start = header_date(&caps[1], &caps[2], &caps[3])?;
            let end = header_date(&caps[4], &caps[5], &caps[6])?;
            Ok((start, end))
        };
        Some(parse())
    }

    /// Parse a `MM/DD/YY - DAY at HH:MM` timestamp. `field` names the crime
    /// field for error messages.
    pub fn parse_timestamp(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<NaiveDateTime, UnitError> {
        let bad = || UnitError::BadTimestamp {
            field,
            value: value.to_string(),
        };
        let caps = self.timestamp.captures(value.trim()).ok_or_else(|| bad())?;

        let number = |i: usize| caps[i].parse::<u32>().map_err(|_| bad());
        let month = number(1)?;
        let day = number(2)?;
        let year = CENTURY + number(3)? as i32;
        let hour = number(4)?;
        let minute = number(5)?;

        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .ok_or_else(|| bad())
    }

    /// Split an occurred range into its start and end text.
    pub fn split_occurred<'f>(&self, value: &'f str) -> Result<(&'f str, &'f str), UnitError> {
        let trimmed = value.trim();
        let caps = self
            .occurred_range
            .captures(trimmed)
            .ok_or_else(|| UnitError::OccurredNotRange(value.to_string()))?;
        match (caps.get(1), caps.get(2)) {
            (Some(start), Some(end)) => Ok((start.as_str(), end.as_str())),
            _ => Err(UnitError::OccurredNotRange(value.to_string())),
        }
    }
}

impl Default for LogPatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Month number (1-12) for a three letter abbreviation such as `Jan`.
pub fn parse_month_abbrev(abbrev: &str) -> Result<u32, UnitError> {
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| *m == abbrev)
        .map(|i| i as u32 + 1)
        .ok_or_else(|| UnitError::UnknownMonth(abbrev.to_string()))
}

fn header_date(month: &str, day: &str, year: &str) -> Result<NaiveDate, UnitError> {
    let bad = || UnitError::BadHeaderDate(format!("{month} {day}, {year}"));
    let month_num = parse_month_abbrev(month)?;
    let day_num = day.parse::<u32>().map_err(|_| bad())?;
    let year_num = year.parse::<i32>().map_err(|_| bad())?;
    NaiveDate::from_ymd_opt(year_num, month_num, day_num).ok_or_else(|| bad())
}

// ═══════════════════════════════════════════
// Occurred range correction
// ═══════════════════════════════════════════

/// Result of checking an occurred range for order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeCheck {
    /// Start is not after end; nothing to do.
    Ordered,
    /// End was shifted forward by the correction window and is now in order.
    Corrected(NaiveDateTime),
    /// Still inverted after the shift.
    Inverted,
}

/// Logs often print the end of an overnight range on a 12 hour clock. When
/// the end precedes the start, shift it forward by `window` and check again.
pub fn check_occurred_range(
    start: NaiveDateTime,
    end: NaiveDateTime,
    window: Duration,
) -> RangeCheck {
    if start <= end {
        return RangeCheck::Ordered;
    }
    match end.checked_add_signed(window) {
        Some(shifted) if shifted >= start => RangeCheck::Corrected(shifted),
        _ => RangeCheck::Inverted,
    }
}

/// Display form used in correction notes.
pub fn format_range(start: NaiveDateTime, end: NaiveDateTime) -> String {
    format!(
        "{} - {}",
        start.format("%Y-%m-%d %H:%M"),
        end.format("%Y-%m-%d %H:%M")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn parses_timestamp() {
        let patterns = LogPatterns::new();
        let ts = patterns
            .parse_timestamp("date_reported", "10/14/17 - FRI at 09:00")
            .unwrap();
        assert_eq!(ts, at(2017, 10, 14, 9, 0));
    }

    #[test]
    fn timestamp_tolerates_surrounding_whitespace() {
        let patterns = LogPatterns::new();
        let ts = patterns
            .parse_timestamp("date_reported", "  01/02/18 - TUE at 23:59 ")
            .unwrap();
        assert_eq!(ts, at(2018, 1, 2, 23, 59));
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let patterns = LogPatterns::new();
        let err = patterns
            .parse_timestamp("date_reported", "10/14/2017 09:00")
            .unwrap_err();
        assert!(matches!(err, UnitError::BadTimestamp { field: "date_reported", .. }));
    }

    #[test]
    fn rejects_impossible_calendar_date() {
        let patterns = LogPatterns::new();
        assert!(patterns
            .parse_timestamp("date_reported", "02/30/17 - THU at 10:00")
            .is_err());
        assert!(patterns
            .parse_timestamp("date_reported", "02/03/17 - FRI at 25:00")
            .is_err());
    }

    #[test]
    fn parses_header_range() {
        let patterns = LogPatterns::new();
        let (start, end) = patterns
            .parse_header_range("From Jan 13, 2016 to Jan 13, 2017.")
            .unwrap()
            .unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2016, 1, 13).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2017, 1, 13).unwrap());
    }

    #[test]
    fn non_header_is_none() {
        let patterns = LogPatterns::new();
        assert!(patterns.parse_header_range("not a date range").is_none());
        assert!(!patterns.is_header_range("From Jan 13, 2016"));
    }

    #[test]
    fn header_with_bad_start_month_errors() {
        let patterns = LogPatterns::new();
        let err = patterns
            .parse_header_range("From Man 13, 2016 to Jan 13, 2017.")
            .unwrap()
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown month abbreviation: Man");
    }

    #[test]
    fn header_with_bad_end_month_errors() {
        let patterns = LogPatterns::new();
        let err = patterns
            .parse_header_range("From Jan 13, 2016 to San 13, 2017.")
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, UnitError::UnknownMonth(m) if m == "San"));
    }

    #[test]
    fn header_with_impossible_day_errors() {
        let patterns = LogPatterns::new();
        let err = patterns
            .parse_header_range("From Feb 31, 2016 to Jan 13, 2017.")
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, UnitError::BadHeaderDate(_)));
    }

    #[test]
    fn month_abbreviations() {
        assert_eq!(parse_month_abbrev("Jan").unwrap(), 1);
        assert_eq!(parse_month_abbrev("Dec").unwrap(), 12);
        assert!(parse_month_abbrev("January").is_err());
        assert!(parse_month_abbrev("jan").is_err());
    }

    #[test]
    fn page_number_matches_raw_digits_only() {
        let patterns = LogPatterns::new();
        assert!(patterns.is_page_number("12"));
        assert!(!patterns.is_page_number(" 3"));
        assert!(!patterns.is_page_number("2017-001"));
    }

    #[test]
    fn splits_occurred_range() {
        let patterns = LogPatterns::new();
        let (start, end) = patterns
            .split_occurred("10/14/17 - FRI at 23:00 - 10/15/17 - SAT at 01:00")
            .unwrap();
        assert_eq!(start, "10/14/17 - FRI at 23:00");
        assert_eq!(end, "10/15/17 - SAT at 01:00");
    }

    #[test]
    fn single_timestamp_is_not_a_range() {
        let patterns = LogPatterns::new();
        assert!(matches!(
            patterns.split_occurred("Unknown"),
            Err(UnitError::OccurredNotRange(_))
        ));
    }

    #[test]
    fn ordered_range_left_alone() {
        let window = Duration::hours(12);
        let start = at(2017, 10, 14, 9, 0);
        assert_eq!(
            check_occurred_range(start, at(2017, 10, 14, 10, 0), window),
            RangeCheck::Ordered
        );
        assert_eq!(check_occurred_range(start, start, window), RangeCheck::Ordered);
    }

    #[test]
    fn end_within_window_is_corrected() {
        let window = Duration::hours(12);
        let check = check_occurred_range(at(2017, 10, 14, 10, 0), at(2017, 10, 14, 1, 0), window);
        assert_eq!(check, RangeCheck::Corrected(at(2017, 10, 14, 13, 0)));
    }

    #[test]
    fn correction_is_idempotent() {
        let window = Duration::hours(12);
        let start = at(2017, 10, 14, 10, 0);
        let RangeCheck::Corrected(fixed) =
            check_occurred_range(start, at(2017, 10, 14, 1, 0), window)
        else {
            panic!("expected a correction");
        };
        assert_eq!(check_occurred_range(start, fixed, window), RangeCheck::Ordered);
    }

    #[test]
    fn end_beyond_window_stays_inverted() {
        let window = Duration::hours(12);
        let check = check_occurred_range(at(2017, 10, 14, 23, 0), at(2017, 10, 14, 1, 0), window);
        assert_eq!(check, RangeCheck::Inverted);
    }

    #[test]
    fn exactly_one_window_apart_is_corrected() {
        let window = Duration::hours(12);
        let check = check_occurred_range(at(2017, 10, 14, 13, 0), at(2017, 10, 14, 1, 0), window);
        assert_eq!(check, RangeCheck::Corrected(at(2017, 10, 14, 13, 0)));
    }

    #[test]
    fn range_display_format() {
        let text = format_range(at(2017, 10, 14, 10, 0), at(2017, 10, 14, 13, 0));
        assert_eq!(text, "2017-10-14 10:00 - 2017-10-14 13:00");
    }
}

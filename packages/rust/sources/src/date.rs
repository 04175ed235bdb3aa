//! Deterministic date and text helpers shared by the adapters.
//!
//! Listing pages show dates in a handful of loose formats, often without a
//! year. Parsing tries a fixed format table; a yearless date is assigned the
//! first year that puts it on or after the reference date. A string that
//! matches no format yields `None` and the normalizer drops the record. No
//! guessing, no fallback dates.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use regex::Regex;

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,2}):(\d{2})\s*(am|pm)").expect("valid time regex"));

static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,2})(st|nd|rd|th)").expect("valid ordinal regex"));

/// Collapse runs of whitespace and trim.
pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the first "H:MM AM/PM" time from free text, normalized to
/// uppercase meridiem.
pub fn extract_time(text: &str) -> Option<String> {
    let caps = TIME_RE.captures(text)?;
    Some(format!(
        "{}:{} {}",
        &caps[1],
        &caps[2],
        caps[3].to_uppercase()
    ))
}

/// Parse a listing date string into a UTC timestamp.
///
/// Accepts RFC 3339 directly, otherwise tries the format table. A date
/// without a year rolls forward: it gets `reference`'s year, or the next
/// year if that would place it in the past. The time-of-day component comes
/// from the string itself when present, else midnight.
pub fn parse_event_date(input: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let cleaned = ORDINAL_RE.replace_all(&clean_text(input), "$1").to_string();

    if let Ok(dt) = DateTime::parse_from_rfc3339(&cleaned) {
        return Some(dt.with_timezone(&Utc));
    }

    let date = parse_naive_date(&cleaned, reference.date_naive())?;
    let time = extract_time(input)
        .and_then(|t| NaiveTime::parse_from_str(&t, "%I:%M %p").ok())
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default());

    Some(date.and_time(time).and_utc())
}

fn parse_naive_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let formats = [
        ("%Y-%m-%d", true),
        ("%d/%m/%Y", true),
        ("%d/%m/%y", true),
        ("%d %B %Y", true),
        ("%d %b %Y", true),
        ("%A %d %B %Y", true),
        ("%B %d, %Y", true),
        ("%b %d, %Y", true),
        ("%d %B", false),
        ("%d %b", false),
        ("%A %d %B", false),
    ];

    // Strip a trailing time fragment ("Sat 12 Oct, 8:00 PM")
    let date_part = input.split(',').next().unwrap_or(input).trim();
    let candidates = [input, date_part];

    for candidate in candidates {
        for (fmt, has_year) in &formats {
            if let Ok(mut date) = NaiveDate::parse_from_str(candidate, fmt) {
                if *has_year {
                    return Some(date);
                }
                date = date.with_year(today.year())?;
                if date < today {
                    date = date.with_year(today.year() + 1)?;
                }
                return Some(date);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Sat  12 Oct \n 8:00 PM "), "Sat 12 Oct 8:00 PM");
    }

    #[test]
    fn extract_time_normalizes_meridiem() {
        assert_eq!(extract_time("Doors at 7:30pm").as_deref(), Some("7:30 PM"));
        assert_eq!(extract_time("11:00 AM start").as_deref(), Some("11:00 AM"));
        assert_eq!(extract_time("all day event"), None);
    }

    #[test]
    fn parses_rfc3339() {
        let parsed = parse_event_date("2024-09-01T18:00:00+10:00", reference()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn parses_full_dates() {
        let parsed = parse_event_date("12 October 2024", reference()).unwrap();
        assert_eq!(parsed.date_naive(), NaiveDate::from_ymd_opt(2024, 10, 12).unwrap());

        let parsed = parse_event_date("01/10/2024", reference()).unwrap();
        assert_eq!(parsed.date_naive(), NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
    }

    #[test]
    fn yearless_date_rolls_forward() {
        // June reference: October stays this year, March rolls to next
        let oct = parse_event_date("12 Oct", reference()).unwrap();
        assert_eq!(oct.date_naive(), NaiveDate::from_ymd_opt(2024, 10, 12).unwrap());

        let mar = parse_event_date("3 March", reference()).unwrap();
        assert_eq!(mar.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
    }

    #[test]
    fn embedded_time_is_used() {
        let parsed = parse_event_date("12 Oct, 8:00 PM", reference()).unwrap();
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2024, 10, 12, 20, 0, 0).unwrap()
        );
    }

    #[test]
    fn ordinal_suffixes_are_stripped() {
        let parsed = parse_event_date("3rd March 2025", reference()).unwrap();
        assert_eq!(parsed.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
    }

    #[test]
    fn garbage_yields_none() {
        assert!(parse_event_date("see website for dates", reference()).is_none());
        assert!(parse_event_date("", reference()).is_none());
    }
}

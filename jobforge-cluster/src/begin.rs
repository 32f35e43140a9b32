//  BEGIN.rs
//    by Lut99
//
//  Created:
//    15 Oct 2024, 09:05:44
//  Last edited:
//    16 Jan 2025, 14:21:37
//  Auto updated?
//    Yes
//
//  Description:
//!   Parses the "when should this job run"-answer. Users may answer in a
//!   handful of human shapes (`now`, `tomorrow`, `2025-06-01 14:00`);
//!   the scheduler wants one canonical timestamp.
//

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};


/***** CONSTANTS *****/
/// The canonical shape we hand to the scheduler's `--begin`.
const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// The explicit timestamp shapes we accept, tried in order.
const ACCEPTED_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];





/***** LIBRARY FUNCTIONS *****/
/// Parses a user's answer to the begin-time question.
///
/// # Arguments
/// - `raw`: The answer to parse. `now` and `today` mean the current moment, `tomorrow` the same
///   moment one day later; anything else must be one of the accepted timestamp shapes.
///
/// # Returns
/// The moment it denotes, or [`None`] if the answer is not a time we understand.
pub fn parse_begin(raw: &str) -> Option<NaiveDateTime> {
    let now: NaiveDateTime = Local::now().naive_local();
    match raw {
        "now" | "today" => return Some(now),
        "tomorrow" => return Some(now + Duration::days(1)),
        _ => {},
    }

    for format in ACCEPTED_FORMATS {
        if let Ok(moment) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(moment);
        }
    }

    // A bare date means midnight; a bare time means today
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M") {
        return Some(NaiveDateTime::new(now.date(), time));
    }

    None
}

/// Checks whether a user's answer denotes a time we understand.
///
/// # Arguments
/// - `raw`: The answer to check.
///
/// # Returns
/// True if [`parse_begin()`] would succeed on it.
#[inline]
pub fn is_begin(raw: &str) -> bool { parse_begin(raw).is_some() }

/// Rewrites a (valid) begin-time answer into the canonical scheduler shape.
///
/// # Arguments
/// - `raw`: The answer to canonicalize. Must have passed [`is_begin()`].
///
/// # Returns
/// The same moment written as `YYYY-MM-DDTHH:MM`, or [`None`] if the answer turns out not to be
/// a time after all.
#[inline]
pub fn canonicalize_begin(raw: &str) -> Option<String> { parse_begin(raw).map(|moment| moment.format(CANONICAL_FORMAT).to_string()) }





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn test_relative_times() {
        assert!(is_begin("now"));
        assert!(is_begin("today"));
        assert!(is_begin("tomorrow"));
        assert!(parse_begin("tomorrow").unwrap() > parse_begin("now").unwrap());
    }

    #[test]
    fn test_explicit_times() {
        assert_eq!(canonicalize_begin("2025-06-01T14:00").as_deref(), Some("2025-06-01T14:00"));
        assert_eq!(canonicalize_begin("2025-06-01 14:30").as_deref(), Some("2025-06-01T14:30"));
        assert_eq!(canonicalize_begin("2025-06-01").as_deref(), Some("2025-06-01T00:00"));
        assert!(is_begin("23:59"));
    }

    #[test]
    fn test_rejects_nonsense() {
        assert!(!is_begin("whenever"));
        assert!(!is_begin("2025-13-01"));
        assert!(!is_begin(""));
    }
}

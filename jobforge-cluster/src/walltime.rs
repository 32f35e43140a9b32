//  WALLTIME.rs
//    by Lut99
//
//  Created:
//    14 Oct 2024, 11:15:20
//  Last edited:
//    16 Jan 2025, 14:03:11
//  Auto updated?
//    Yes
//
//  Description:
//!   Converts between fractional hours and the scheduler's
//!   `[days-]HH:MM:SS` walltime notation.
//


/***** CONSTANTS *****/
/// The number of hours that an `infinite` time limit maps to (one year).
pub const INFINITE_HOURS: f64 = 365.0 * 24.0;





/***** LIBRARY FUNCTIONS *****/
/// Converts a number of hours to "scheduler time".
///
/// # Arguments
/// - `hours`: The (fractional) number of hours to convert.
///
/// # Returns
/// The same duration written as `HH:MM:SS`, or `D-HH:MM:SS` when it spans full days.
pub fn hours_to_walltime(hours: f64) -> String {
    let total: u64 = (hours * 3600.0).round() as u64;

    let days: u64 = total / 86400;
    let hours: u64 = (total % 86400) / 3600;
    let minutes: u64 = (total % 3600) / 60;
    let seconds: u64 = total % 60;

    if days > 0 { format!("{days}-{hours:02}:{minutes:02}:{seconds:02}") } else { format!("{hours:02}:{minutes:02}:{seconds:02}") }
}

/// Converts a scheduler time like `2-12:00:00` to a number of hours.
///
/// The parse is deliberately lenient, mirroring what the inventory tool prints: `infinite` maps
/// to [one year](INFINITE_HOURS), and anything else that does not look like `[days-]HH:MM:SS`
/// maps to zero hours.
///
/// # Arguments
/// - `walltime`: The scheduler time string to convert.
///
/// # Returns
/// The duration it denotes, as a fractional number of hours.
pub fn walltime_to_hours(walltime: &str) -> f64 {
    if walltime == "infinite" {
        return INFINITE_HOURS;
    }

    // Expect exactly the three colon-separated parts
    let parts: Vec<&str> = walltime.split(':').collect();
    let [hours, minutes, seconds] = parts[..] else {
        return 0.0;
    };

    // The hour part optionally carries a day prefix
    let (days, hours): (&str, &str) = match hours.split_once('-') {
        Some((days, hours)) => (days, hours),
        None => ("0", hours),
    };

    let days: f64 = days.parse::<u64>().unwrap_or(0) as f64;
    let hours: f64 = hours.parse::<u64>().unwrap_or(0) as f64;
    let minutes: f64 = minutes.parse::<u64>().unwrap_or(0) as f64;
    let seconds: f64 = seconds.parse::<u64>().unwrap_or(0) as f64;

    days * 24.0 + hours + minutes / 60.0 + seconds / 3600.0
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn test_hours_to_walltime() {
        assert_eq!(hours_to_walltime(1.0), "01:00:00");
        assert_eq!(hours_to_walltime(1.5), "01:30:00");
        assert_eq!(hours_to_walltime(0.25), "00:15:00");
        assert_eq!(hours_to_walltime(23.0), "23:00:00");
        assert_eq!(hours_to_walltime(24.0), "1-00:00:00");
        assert_eq!(hours_to_walltime(60.0), "2-12:00:00");
    }

    #[test]
    fn test_walltime_to_hours() {
        assert_eq!(walltime_to_hours("01:30:00"), 1.5);
        assert_eq!(walltime_to_hours("2-12:00:00"), 60.0);
        assert_eq!(walltime_to_hours("infinite"), INFINITE_HOURS);

        // Lenient fallbacks
        assert_eq!(walltime_to_hours("whenever"), 0.0);
        assert_eq!(walltime_to_hours("15:00"), 0.0);
    }

    #[test]
    fn test_roundtrip() {
        for hours in [0.5, 1.0, 1.5, 8.0, 23.99, 24.0, 60.0, 72.0] {
            let there: String = hours_to_walltime(hours);
            let back: f64 = walltime_to_hours(&there);
            assert!((hours - back).abs() < 1.0 / 3600.0, "{hours}h -> {there:?} -> {back}h");
        }
    }
}

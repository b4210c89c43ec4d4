//! Approximate start years for period labels such as `450-1150 AD`.

use once_cell::sync::Lazy;
use regex::Regex;

pub const UNKNOWN_PERIOD: &str = "Unknown period";

static PERIOD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(BC|AD)?(?:\s*-\s*(?:\d+|present)\s*(BC|AD)?)?")
        .expect("valid period regex")
});

/// Returns the first year a period label covers.
///
/// Years are AD unless a `BC` marker applies to the first number, either
/// directly (`500 BC-500 AD`) or through the end of an unmarked range
/// (`1500-500 BC`). Labels without a number yield 0.
pub fn start_year(period: &str) -> i32 {
    let period = period.trim();
    if period.is_empty() || period.eq_ignore_ascii_case(UNKNOWN_PERIOD) {
        return 0;
    }
    let Some(caps) = PERIOD_PATTERN.captures(period) else {
        return 0;
    };
    let Ok(year) = caps[1].parse::<i32>() else {
        return 0;
    };
    let first_marker = caps.get(2).map(|m| m.as_str());
    let range_marker = caps.get(3).map(|m| m.as_str());
    let is_bc = match first_marker {
        Some(marker) => marker.eq_ignore_ascii_case("BC"),
        None => range_marker.is_some_and(|marker| marker.eq_ignore_ascii_case("BC")),
    };
    if is_bc { -year } else { year }
}

/// Renders a signed year for display, e.g. `-500` as `500 BC`.
pub fn format_year(year: i32) -> String {
    if year < 0 {
        format!("{} BC", year.unsigned_abs())
    } else {
        format!("{year} AD")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bc_marker_is_negative() {
        assert_eq!(start_year("500 BC"), -500);
        assert_eq!(start_year("500 BC-500 AD"), -500);
        assert_eq!(start_year("800 BC-present"), -800);
    }

    #[test]
    fn ad_ranges_use_first_year() {
        assert_eq!(start_year("450-1150 AD"), 450);
        assert_eq!(start_year("500 AD-present"), 500);
        assert_eq!(start_year("Modern English (1500-present)"), 1500);
    }

    #[test]
    fn unmarked_start_takes_range_era() {
        assert_eq!(start_year("1500-500 BC"), -1500);
        assert_eq!(start_year("4500-2500 BC"), -4500);
    }

    #[test]
    fn unparsable_periods_default_to_zero() {
        assert_eq!(start_year(""), 0);
        assert_eq!(start_year(UNKNOWN_PERIOD), 0);
        assert_eq!(start_year("sometime long ago"), 0);
    }

    #[test]
    fn formats_signed_years() {
        assert_eq!(format_year(-500), "500 BC");
        assert_eq!(format_year(842), "842 AD");
    }
}

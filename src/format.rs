//! Number formatting for scorecards, the sales table and chart axes

use num_format::{Locale, ToFormattedString};

/// Formats a number with comma thousands separators and at most three
/// fractional digits, e.g. `1234567.891` becomes `1,234,567.891`
pub fn thousands(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut formatted = String::new();
    if value < 0.0 && (integer != "0" || !fraction.is_empty()) {
        formatted.push('-');
    }
    formatted.push_str(&group_digits(integer));
    if !fraction.is_empty() {
        formatted.push('.');
        formatted.push_str(fraction);
    }

    formatted
}

/// Formats an amount as whole dollars, e.g. `1234567.5` becomes `$1,234,568`
pub fn currency(value: f64) -> String {
    let sign = if value <= -0.5 { "-" } else { "" };
    format!("{sign}${}", group_digits(&format!("{:.0}", value.abs())))
}

/// Abbreviates large axis values with a `K`, `M` or `B` suffix
///
/// The value is only divided, never rounded: `1234567` becomes `1.234567M`.
/// Values below one thousand are printed as they are.
pub fn compact(value: f64) -> String {
    if value >= 1e9 {
        format!("{}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{}K", value / 1e3)
    } else {
        format!("{value}")
    }
}

/// Inserts the `en` locale thousands separators into a string of digits
fn group_digits(digits: &str) -> String {
    digits
        .parse::<u128>()
        .map(|integer| integer.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| digits.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(1000.0), "1,000");
        assert_eq!(thousands(1234567.0), "1,234,567");
        assert_eq!(thousands(12345678901.0), "12,345,678,901");
        assert_eq!(thousands(-1234.0), "-1,234");
        assert_eq!(thousands(4_503_599_627_370_495.0), "4,503,599,627,370,495");
    }

    #[test]
    fn thousands_keeps_up_to_three_fractional_digits() {
        assert_eq!(thousands(1234.5), "1,234.5");
        assert_eq!(thousands(0.125), "0.125");
        assert_eq!(thousands(2.0004), "2");
        assert_eq!(thousands(-0.0001), "0");
    }

    #[test]
    fn currency_rounds_to_whole_dollars() {
        assert_eq!(currency(0.0), "$0");
        assert_eq!(currency(499000.0), "$499,000");
        assert_eq!(currency(1234567.75), "$1,234,568");
        assert_eq!(currency(-2000.0), "-$2,000");
    }

    #[test]
    fn compact_divides_without_rounding() {
        assert_eq!(compact(0.0), "0");
        assert_eq!(compact(999.0), "999");
        assert_eq!(compact(12.5), "12.5");
        assert_eq!(compact(1000.0), "1K");
        assert_eq!(compact(1500.0), "1.5K");
        assert_eq!(compact(1234567.0), "1.234567M");
        assert_eq!(compact(2e9), "2B");
        assert_eq!(compact(-5000.0), "-5000");
    }
}

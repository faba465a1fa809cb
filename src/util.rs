// Parsing and basic statistics helpers.
//
// Everything that touches raw cell text or does plain arithmetic over
// slices lives here, so the aggregation code can work with typed values.
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

static THOUSANDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{1,3}(,\d{3})+(\.\d+)?$").expect("valid regex"));
static DECIMAL_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+,\d{1,2}$").expect("valid regex"));

/// Parse a cell into `f64`, forgiving the formatting noise of spreadsheet exports.
///
/// - Trims whitespace (including non-breaking spaces).
/// - Strips a trailing `%`.
/// - Rejects values that contain alphabetic characters.
/// - Drops `,` thousands separators (`1,250`), reads a comma followed by one
///   or two digits as a decimal comma (`66,7`), rejects any other comma.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim_matches(|c: char| c.is_whitespace() || c == '\u{a0}');
    let s = s.strip_suffix('%').unwrap_or(s).trim_end();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    let s: String = s
        .chars()
        .filter(|c| *c != '\u{a0}' && *c != ' ')
        .collect();
    let s = if !s.contains(',') {
        s
    } else if THOUSANDS.is_match(&s) {
        s.replace(',', "")
    } else if DECIMAL_COMMA.is_match(&s) {
        s.replace(',', ".")
    } else {
        return None;
    };
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn average(v: &[f64]) -> f64 {
    // Returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Mean of the present values, `None` when nothing is present.
pub fn mean_present(v: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = v.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(average(&present))
    }
}

/// Sample standard deviation (n - 1 denominator). Needs two values.
pub fn sample_std(v: &[f64]) -> Option<f64> {
    if v.len() < 2 {
        return None;
    }
    let mean = average(v);
    let ss: f64 = v.iter().map(|x| (x - mean).powi(2)).sum();
    Some((ss / (v.len() - 1) as f64).sqrt())
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(mut v: Vec<f64>, q: f64) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let pos = q.clamp(0.0, 1.0) * (v.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(v[lo] + (v[hi] - v[lo]) * frac)
}

pub fn median(v: Vec<f64>) -> Option<f64> {
    quantile(v, 0.5)
}

pub fn round_to(n: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (n * factor).round() / factor
}

/// Percentage `part / whole * 100`, 0 when `whole` is 0.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators (e.g. `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// `format_number` for optional values, `N/A` when missing.
pub fn format_opt(n: Option<f64>, decimals: usize) -> String {
    n.map(|v| format_number(v, decimals))
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_spreadsheet_noise() {
        assert_eq!(parse_f64_safe(Some(" 1,250 ")), Some(1250.0));
        assert_eq!(parse_f64_safe(Some("12.5%")), Some(12.5));
        assert_eq!(parse_f64_safe(Some("-3")), Some(-3.0));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn comma_is_decimal_or_grouping_never_both() {
        assert_eq!(parse_f64_safe(Some("66,7")), Some(66.7));
        assert_eq!(parse_f64_safe(Some("33,33 %")), Some(33.33));
        assert_eq!(parse_f64_safe(Some("-0,5")), Some(-0.5));
        assert_eq!(parse_f64_safe(Some("12,345,678.5")), Some(12345678.5));
        assert_eq!(parse_f64_safe(Some("1 250,5")), Some(1250.5));
        assert_eq!(parse_f64_safe(Some("1,2,3")), None);
        assert_eq!(parse_f64_safe(Some("1,2345")), None);
        assert_eq!(parse_f64_safe(Some(",5")), None);
    }

    #[test]
    fn quantile_interpolates_like_spreadsheets() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(v.clone(), 0.25), Some(1.75));
        assert_eq!(quantile(v.clone(), 0.75), Some(3.25));
        assert_eq!(median(v), Some(2.5));
        assert_eq!(quantile(vec![], 0.5), None);
    }

    #[test]
    fn sample_std_needs_two_values() {
        assert_eq!(sample_std(&[4.0]), None);
        let s = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((s - 2.138089935).abs() < 1e-6);
    }

    #[test]
    fn percentage_of_zero_is_zero() {
        assert_eq!(percentage(0.0, 0.0), 0.0);
        assert_eq!(percentage(1.0, 4.0), 25.0);
    }

    #[test]
    fn formats_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-0.5, 1), "-0.5");
        assert_eq!(format_number(0.0, 1), "0.0");
        assert_eq!(format_opt(None, 2), "N/A");
        assert_eq!(format_int(9855), "9,855");
    }
}

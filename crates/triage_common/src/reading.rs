//! Numeric reading helpers shared by strategies
//!
//! "Not obtained" is always `None`. A reading of `0.0` is a real zero.

/// Negative readings clamp to 0
pub fn clamp_non_negative(value: f64) -> f64 {
    if value < 0.0 {
        0.0
    } else {
        value
    }
}

/// Percentages clamp into `0..=100`
pub fn clamp_percent(value: f64) -> f64 {
    clamp_non_negative(value).min(100.0)
}

/// Clamped percentage, or `None` for NaN and infinities
pub fn percent(value: f64) -> Option<f64> {
    value.is_finite().then(|| clamp_percent(value))
}

/// `part` as a percentage of `whole`; `None` when `whole` is not positive
pub fn percent_of(part: f64, whole: f64) -> Option<f64> {
    if !whole.is_finite() || whole <= 0.0 {
        return None;
    }
    // Multiply first: exact integer shares stay exact
    percent(part * 100.0 / whole)
}

/// Bytes to gigabytes (binary)
pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0 / 1024.0
}

/// Shortest readable form of a reading: `7`, `19.999`, `23.457`
pub fn format_reading(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{:.0}", value);
    }
    trimmed(value, 3)
}

/// Format `value` next to `limit` with enough decimals that the two never
/// read the same unless they are equal
pub fn format_reading_against(value: f64, limit: f64) -> String {
    let shown = format_reading(value);
    if value == limit || shown != format_reading(limit) {
        return shown;
    }
    (4..=12)
        .find(|&decimals| trimmed(value, decimals) != trimmed(limit, decimals))
        .map_or_else(|| value.to_string(), |decimals| trimmed(value, decimals))
}

fn trimmed(value: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, value);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(-5.0), 0.0);
        assert_eq!(clamp_percent(104.2), 100.0);
        assert_eq!(clamp_percent(42.0), 42.0);
    }

    #[test]
    fn test_zero_is_a_reading() {
        assert_eq!(percent(0.0), Some(0.0));
        assert_eq!(percent(f64::NAN), None);
        assert_eq!(percent(f64::INFINITY), None);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(25.0, 100.0), Some(25.0));
        assert_eq!(percent_of(5.0, 0.0), None);
        assert_eq!(percent_of(150.0, 100.0), Some(100.0));
    }

    #[test]
    fn test_percent_of_whole_shares_are_exact() {
        for share in 1..100u32 {
            assert_eq!(percent_of(share as f64, 100.0), Some(share as f64), "share {}", share);
        }
        let gb = (1024u64 * 1024 * 1024) as f64;
        assert_eq!(percent_of(29.0 * gb, 100.0 * gb), Some(29.0));
    }

    #[test]
    fn test_format_reading() {
        assert_eq!(format_reading(7.0), "7");
        assert_eq!(format_reading(19.999), "19.999");
        assert_eq!(format_reading(23.456789), "23.457");
        assert_eq!(format_reading(12.5), "12.5");
    }

    #[test]
    fn test_format_reading_against_limit() {
        assert_eq!(format_reading_against(19.9999, 20.0), "19.9999");
        assert_eq!(format_reading_against(20.0004, 20.0), "20.0004");
        assert_eq!(format_reading_against(15.0, 20.0), "15");
        assert_eq!(format_reading_against(20.0, 20.0), "20");
        assert_eq!(format_reading_against(23.456789, 20.0), "23.457");
    }

    #[test]
    fn test_bytes_to_gb() {
        assert_eq!(bytes_to_gb(1024 * 1024 * 1024), 1.0);
    }
}

//! Display formatting helpers shared by the API and log output.

/// Rounds to two decimal places for display.
///
/// Only applied to finished totals; sums are always computed unrounded.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats a GB amount with two decimals: `3.75`, `4.00`.
pub fn format_gb(value: f64) -> String {
    format!("{:.2}", value)
}

/// Formats a duration in milliseconds with one decimal for timing logs.
pub fn format_ms(duration: std::time::Duration) -> String {
    format!("{:.1}ms", duration.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.75), 3.75);
        assert_eq!(round2(7.7549), 7.75);
        assert_eq!(round2(0.390625), 0.39);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_format_gb() {
        assert_eq!(format_gb(4.0), "4.00");
        assert_eq!(format_gb(3.75), "3.75");
        assert_eq!(format_gb(0.390625), "0.39");
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(Duration::from_micros(1500)), "1.5ms");
    }
}

//! Compound duration strings
//!
//! Operator-facing commands express durations as compact unit strings like
//! `"1d12h30m"` or `"2w"`. Units: `y` (365d), `mo` (30d), `w`, `d`, `h`,
//! `m`, `s`; a bare number is seconds. Parsing is case-insensitive and
//! tolerates separating whitespace. Empty, zero, and unparsable input all
//! fail with `InvalidDuration` - a restriction with no positive lifetime is
//! never representable.

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use warden_core_restrict::{RestrictError, Result};

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_DAY: u64 = 86_400;

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // `mo` must be tried before `m` so "2mo" is months, not minutes
        Regex::new(
            r"(?i)^\s*(?:(\d+)\s*y\s*)?(?:(\d+)\s*mo\s*)?(?:(\d+)\s*w\s*)?(?:(\d+)\s*d\s*)?(?:(\d+)\s*h\s*)?(?:(\d+)\s*m\s*)?(?:(\d+)\s*s?\s*)?$",
        )
        .expect("time pattern is valid")
    })
}

/// Parse a compound duration string into a `Duration`
pub fn parse_duration(input: &str) -> Result<Duration> {
    if input.trim().is_empty() {
        return Err(RestrictError::invalid_duration("empty duration string"));
    }

    let captures = time_pattern()
        .captures(input)
        .ok_or_else(|| RestrictError::invalid_duration(input))?;

    let group = |i: usize| -> Result<u64> {
        match captures.get(i) {
            None => Ok(0),
            Some(m) => m
                .as_str()
                .parse::<u64>()
                .map_err(|_| RestrictError::invalid_duration(input)),
        }
    };

    let total_secs = group(1)? * 365 * SECS_PER_DAY
        + group(2)? * 30 * SECS_PER_DAY
        + group(3)? * 7 * SECS_PER_DAY
        + group(4)? * SECS_PER_DAY
        + group(5)? * SECS_PER_HOUR
        + group(6)? * SECS_PER_MINUTE
        + group(7)?;

    if total_secs == 0 {
        return Err(RestrictError::invalid_duration(input));
    }

    Ok(Duration::from_secs(total_secs))
}

/// Format a duration as a compact unit string (`"1d 12h 30m"`)
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }

    let days = secs / SECS_PER_DAY;
    secs %= SECS_PER_DAY;
    let hours = secs / SECS_PER_HOUR;
    secs %= SECS_PER_HOUR;
    let minutes = secs / SECS_PER_MINUTE;
    secs %= SECS_PER_MINUTE;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if secs > 0 {
        parts.push(format!("{}s", secs));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("1w").unwrap(), Duration::from_secs(7 * 86_400));
        assert_eq!(
            parse_duration("1mo").unwrap(),
            Duration::from_secs(30 * 86_400)
        );
        assert_eq!(
            parse_duration("1y").unwrap(),
            Duration::from_secs(365 * 86_400)
        );
    }

    #[test]
    fn test_parse_compound() {
        assert_eq!(
            parse_duration("1d12h30m").unwrap(),
            Duration::from_secs(86_400 + 12 * 3600 + 30 * 60)
        );
        assert_eq!(
            parse_duration("1h 30m 15s").unwrap(),
            Duration::from_secs(3600 + 30 * 60 + 15)
        );
    }

    #[test]
    fn test_parse_bare_number_is_seconds() {
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(parse_duration("2H").unwrap(), Duration::from_secs(7200));
        assert_eq!(
            parse_duration("1D6H").unwrap(),
            Duration::from_secs(86_400 + 6 * 3600)
        );
    }

    #[test]
    fn test_months_are_not_minutes() {
        assert_eq!(
            parse_duration("2mo").unwrap(),
            Duration::from_secs(2 * 30 * 86_400)
        );
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn test_invalid_inputs() {
        for input in ["", "   ", "abc", "1x", "-5m", "0", "0s", "0m"] {
            assert!(
                matches!(parse_duration(input), Err(RestrictError::InvalidDuration(_))),
                "expected InvalidDuration for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0s");
        assert_eq!(format_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(Duration::from_secs(3600 + 120)), "1h 2m");
        assert_eq!(
            format_duration(Duration::from_secs(86_400 + 12 * 3600 + 30 * 60)),
            "1d 12h 30m"
        );
    }

    #[test]
    fn test_roundtrip() {
        let original = parse_duration("2d4h5m6s").unwrap();
        let formatted = format_duration(original);
        assert_eq!(parse_duration(&formatted).unwrap(), original);
    }
}

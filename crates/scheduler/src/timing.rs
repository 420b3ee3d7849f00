//! Preferred posting hours for automatic scheduling.

use chrono::{DateTime, Duration, TimeZone, Utc};
use platforms::Platform;

/// Hour of day (UTC) that tends to perform best on each platform.
pub fn preferred_hour(platform: Platform) -> u32 {
    match platform {
        Platform::LinkedIn => 8,
        Platform::WordPress => 9,
        Platform::Webflow => 10,
        Platform::Instagram => 11,
        Platform::Twitter => 12,
        Platform::Facebook => 13,
    }
}

/// Next preferred hour strictly after `now`, across all `platforms`.
/// Falls back to `now` when there are no platforms.
pub fn next_posting_time(platforms: &[Platform], now: DateTime<Utc>) -> DateTime<Utc> {
    platforms
        .iter()
        .map(|p| next_occurrence(preferred_hour(*p), now))
        .min()
        .unwrap_or(now)
}

fn next_occurrence(hour: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(naive) = now.date_naive().and_hms_opt(hour, 0, 0) else {
        return now;
    };
    let candidate = Utc.from_utc_datetime(&naive);
    if candidate > now {
        candidate
    } else {
        candidate + Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_same_day_slot() {
        let next = next_posting_time(&[Platform::Twitter], at(7, 30));
        assert_eq!(next, at(12, 0));
    }

    #[test]
    fn test_earliest_platform_wins() {
        let next = next_posting_time(&[Platform::Facebook, Platform::LinkedIn], at(7, 0));
        assert_eq!(next, at(8, 0));
    }

    #[test]
    fn test_rolls_to_tomorrow() {
        let next = next_posting_time(&[Platform::LinkedIn], at(8, 0));
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_no_platforms() {
        assert_eq!(next_posting_time(&[], at(3, 0)), at(3, 0));
    }
}

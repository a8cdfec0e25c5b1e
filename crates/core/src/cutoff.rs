//! Weekly order-cutoff policy.
//!
//! Ordering is disallowed from the Friday deadline (12:00 local by default)
//! until that Friday rolls over; every other moment allows ordering. The
//! deadline moment itself counts as closed. "Local" is the explicitly
//! configured cutoff timezone (`config::cutoff::offset`), never the server's
//! own clock zone.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday};

use crate::config;

/// Pure policy check against an explicit local timestamp and deadline time.
pub fn is_order_allowed_with(local_now: NaiveDateTime, deadline: NaiveTime) -> bool {
    local_now.weekday() != Weekday::Fri || local_now.time() < deadline
}

/// Policy check against an explicit local timestamp with the configured
/// deadline time.
pub fn is_order_allowed_at(local_now: NaiveDateTime) -> bool {
    is_order_allowed_with(local_now, config::cutoff::deadline())
}

/// Policy check for "now" in the configured cutoff timezone.
pub fn is_order_allowed() -> bool {
    let local_now = Utc::now().with_timezone(&config::cutoff::offset()).naive_local();
    is_order_allowed_at(local_now)
}

/// Seconds until the next reopen on the configured cutoff clock, for the
/// refusal log line. Returns 0 when ordering is currently allowed.
pub fn seconds_until_reopen_now() -> i64 {
    let local_now = Utc::now().with_timezone(&config::cutoff::offset()).naive_local();
    seconds_until_reopen(local_now)
}

/// Seconds until the next reopen for an explicit local timestamp.
/// Returns 0 when ordering is currently allowed.
pub fn seconds_until_reopen(local_now: NaiveDateTime) -> i64 {
    if is_order_allowed_at(local_now) {
        return 0;
    }
    let end_of_day = 24 * 60 * 60;
    end_of_day - i64::from(local_now.num_seconds_from_midnight())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .unwrap()
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn friday_before_deadline_is_open() {
        // 2026-08-28 is a Friday
        assert!(is_order_allowed_with(at(2026, 8, 28, 11, 59, 0), noon()));
    }

    #[test]
    fn friday_at_deadline_is_closed() {
        assert!(!is_order_allowed_with(at(2026, 8, 28, 12, 0, 0), noon()));
    }

    #[test]
    fn friday_just_past_deadline_is_closed() {
        assert!(!is_order_allowed_with(at(2026, 8, 28, 12, 0, 1), noon()));
    }

    #[test]
    fn friday_evening_is_closed() {
        assert!(!is_order_allowed_with(at(2026, 8, 28, 23, 59, 59), noon()));
    }

    #[test]
    fn saturday_just_after_midnight_is_open() {
        assert!(is_order_allowed_with(at(2026, 8, 29, 0, 0, 1), noon()));
    }

    #[test]
    fn mid_week_is_open() {
        // Wednesday, even past noon
        assert!(is_order_allowed_with(at(2026, 8, 26, 15, 30, 0), noon()));
    }

    #[test]
    fn reopen_countdown_covers_rest_of_friday() {
        let closed_at = at(2026, 8, 28, 23, 59, 0);
        assert_eq!(seconds_until_reopen(closed_at), 60);
        assert_eq!(seconds_until_reopen(at(2026, 8, 26, 15, 30, 0)), 0);
    }
}

use once_cell::sync::Lazy;
use std::env;

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: farmconnect.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "farmconnect.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Port for the HTTP surface (payment webhook, health)
/// Read from WEB_PORT environment variable
/// Default: 8080
pub static WEB_PORT: Lazy<u16> = Lazy::new(|| {
    env::var("WEB_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080)
});

/// Order-cutoff configuration.
///
/// Ordering closes every Friday at the configured local time and reopens at
/// the end of that Friday. The "local" clock is anchored to an explicitly
/// configured UTC offset rather than whatever timezone the server happens to
/// run in.
pub mod cutoff {
    use chrono::{FixedOffset, NaiveTime, Offset, Utc};
    use once_cell::sync::Lazy;
    use std::env;

    /// Hour of the Friday deadline (local), CUTOFF_HOUR env var.
    pub static HOUR: Lazy<u32> = Lazy::new(|| {
        env::var("CUTOFF_HOUR")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|h| *h < 24)
            .unwrap_or(12)
    });

    /// Minute of the Friday deadline (local), CUTOFF_MINUTE env var.
    pub static MINUTE: Lazy<u32> = Lazy::new(|| {
        env::var("CUTOFF_MINUTE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|m| *m < 60)
            .unwrap_or(0)
    });

    /// UTC offset in minutes for the cutoff clock, CUTOFF_UTC_OFFSET_MINUTES
    /// env var. Default +60 (Europe/Berlin standard time).
    pub static UTC_OFFSET_MINUTES: Lazy<i32> = Lazy::new(|| {
        env::var("CUTOFF_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|m: &i32| m.abs() < 24 * 60)
            .unwrap_or(60)
    });

    /// The configured deadline as a time of day.
    pub fn deadline() -> NaiveTime {
        NaiveTime::from_hms_opt(*HOUR, *MINUTE, 0).unwrap_or(NaiveTime::MIN)
    }

    /// The configured cutoff timezone as a fixed offset.
    pub fn offset() -> FixedOffset {
        // The range filter above keeps the offset valid; UTC is the fallback.
        FixedOffset::east_opt(*UTC_OFFSET_MINUTES * 60).unwrap_or_else(|| Utc.fix())
    }
}

/// Onboarding session configuration.
pub mod onboarding {
    use std::time::Duration;

    /// Abandoned onboarding sessions are dropped after this long.
    pub const SESSION_TTL_SECS: u64 = 24 * 60 * 60;

    /// Session time-to-live duration.
    pub fn session_ttl() -> Duration {
        Duration::from_secs(SESSION_TTL_SECS)
    }
}

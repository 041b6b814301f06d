// A simple module to define the time types used in the project
//
// Wall clock values are only used to seed verifiers, name test objects
// uniquely per run and stamp AUTH_SYS credentials. Nothing here is used
// for timeouts, which rely on tokio's monotonic clock.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Seconds timestamps used to determine it using its type
pub type TimestampSeconds = u64;

// Duration since the unix epoch, zero if the system clock is set before it
#[inline]
pub fn get_current_time() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
}

// Return timestamp in seconds
pub fn get_current_time_in_seconds() -> TimestampSeconds {
    get_current_time().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_follow_duration() {
        let secs = get_current_time_in_seconds();
        let now = get_current_time().as_secs();
        assert!(now >= secs);
        assert!(now - secs <= 1);
    }
}

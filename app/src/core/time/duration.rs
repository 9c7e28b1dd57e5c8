use std::fmt::Display;

use super::DateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    pub(super) delegate: chrono::Duration,
}

impl Duration {
    pub(super) fn new(delegate: chrono::Duration) -> Self {
        Self { delegate }
    }

    /// Time left from `now` until the next quarter-hour boundary. Never zero.
    pub fn until_next_quarter_hour(now: &DateTime) -> Self {
        now.next_quarter_hour().elapsed_since(*now)
    }

    pub fn minutes(minutes: i64) -> Self {
        Self::new(chrono::Duration::minutes(minutes))
    }

    pub fn seconds(seconds: i64) -> Self {
        Self::new(chrono::Duration::seconds(seconds))
    }

    pub fn millis(millis: i64) -> Self {
        Self::new(chrono::Duration::milliseconds(millis))
    }

    pub fn as_millis(&self) -> i64 {
        self.delegate.num_milliseconds()
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.delegate.num_milliseconds() as f64 / 1000.0
    }
}

impl std::ops::Add<Duration> for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Self::Output {
        Self::new(self.delegate + rhs.delegate)
    }
}

impl Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.delegate.num_seconds();
        match (secs / 60, secs % 60) {
            (0, s) => write!(f, "{}s", s),
            (m, 0) => write!(f, "{}m", m),
            (m, s) => write!(f, "{}m {}s", m, s),
        }
    }
}

//Negative durations clamp to zero, a sleep can't go backwards
impl From<Duration> for std::time::Duration {
    fn from(val: Duration) -> Self {
        let millis = val.delegate.num_milliseconds().max(0);
        std::time::Duration::from_millis(millis as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_minutes_and_seconds() {
        assert_eq!(Duration::seconds(5).to_string(), "5s");
        assert_eq!(Duration::minutes(15).to_string(), "15m");
        assert_eq!(Duration::seconds(450).to_string(), "7m 30s");
    }

    #[test]
    fn negative_duration_converts_to_zero_std_duration() {
        let std: std::time::Duration = Duration::seconds(-3).into();

        assert_eq!(std, std::time::Duration::ZERO);
    }

    #[test]
    fn until_next_quarter_from_mid_quarter() {
        let now = DateTime::from_iso("2025-01-10T10:07:30+00:00").unwrap();

        assert_eq!(Duration::until_next_quarter_hour(&now), Duration::seconds(450));
    }
}

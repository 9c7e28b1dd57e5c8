use std::{
    fmt::Display,
    ops::{Add, Sub},
};

use chrono::Timelike;
use tokio::task_local;

use super::Duration;

task_local! {
    pub static FIXED_NOW: DateTime;
}

const QUARTER_HOUR_MINUTES: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DateTime {
    delegate: chrono::DateTime<chrono::Local>,
}

impl DateTime {
    fn new<T: chrono::TimeZone>(delegate: chrono::DateTime<T>) -> Self {
        Self {
            delegate: delegate.with_timezone(&chrono::Local),
        }
    }

    pub fn now() -> Self {
        FIXED_NOW
            .try_with(|t| *t)
            .unwrap_or_else(|_| chrono::Local::now().into())
    }

    pub fn from_iso(iso8601: &str) -> anyhow::Result<Self> {
        Ok(chrono::DateTime::parse_from_rfc3339(iso8601)?.into())
    }

    pub fn from_epoch_millis(millis: i64) -> anyhow::Result<Self> {
        chrono::DateTime::from_timestamp_millis(millis)
            .map(Into::into)
            .ok_or_else(|| anyhow::anyhow!("Timestamp {} out of range", millis))
    }

    pub fn to_iso_string(&self) -> String {
        self.delegate.to_rfc3339()
    }

    /// Next wall-clock quarter hour (minute 0, 15, 30 or 45 at second 0), strictly after `self`.
    /// A timestamp exactly on a boundary yields the following boundary.
    pub fn next_quarter_hour(&self) -> Self {
        let into_quarter = chrono::Duration::minutes(i64::from(self.delegate.minute() % QUARTER_HOUR_MINUTES))
            + chrono::Duration::seconds(i64::from(self.delegate.second()))
            + chrono::Duration::nanoseconds(i64::from(self.delegate.nanosecond()));

        Self::new(self.delegate - into_quarter) + Duration::minutes(i64::from(QUARTER_HOUR_MINUTES))
    }

    pub fn elapsed_since(&self, since: Self) -> Duration {
        Duration::new(self.delegate - since.delegate)
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.delegate.format("%Y-%m-%d %H:%M:%S%:z"))
    }
}

impl Add<Duration> for DateTime {
    type Output = DateTime;

    fn add(self, rhs: Duration) -> Self::Output {
        Self::new(self.delegate + rhs.delegate)
    }
}

impl Sub<Duration> for DateTime {
    type Output = DateTime;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self::new(self.delegate - rhs.delegate)
    }
}

impl<T: chrono::TimeZone> From<chrono::DateTime<T>> for DateTime {
    fn from(val: chrono::DateTime<T>) -> Self {
        DateTime::new(val)
    }
}

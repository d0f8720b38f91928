use std::{
    fmt::Display,
    ops::{Add, AddAssign, Sub},
};

use chrono::NaiveDate;

use super::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DateTime {
    pub(super) delegate: chrono::DateTime<chrono::Utc>,
}

impl DateTime {
    pub(super) fn new(delegate: chrono::DateTime<chrono::Utc>) -> Self {
        Self { delegate }
    }

    pub fn now() -> Self {
        Self::new(chrono::Utc::now())
    }

    /// Start of the given calendar day in UTC.
    pub fn midnight(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    pub fn from_iso(iso8601: &str) -> anyhow::Result<Self> {
        Ok(Self::new(
            chrono::DateTime::parse_from_rfc3339(iso8601)?.with_timezone(&chrono::Utc),
        ))
    }

    pub fn to_human_readable(&self) -> String {
        chrono_humanize::HumanTime::from(self.delegate).to_string()
    }

    /// `None` when the result lies outside the representable range.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        self.delegate.checked_add_signed(duration.delegate).map(Self::new)
    }

    pub fn checked_sub(&self, duration: Duration) -> Option<Self> {
        self.delegate.checked_sub_signed(duration.delegate).map(Self::new)
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.delegate.format("%Y-%m-%d %H:%M:%S"))
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

impl Sub<DateTime> for DateTime {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration::new(self.delegate - rhs.delegate)
    }
}

impl AddAssign<Duration> for DateTime {
    fn add_assign(&mut self, rhs: Duration) {
        self.delegate += rhs.delegate;
    }
}

use std::fmt::Display;

use support::time::{DateTime, Duration, Time};

use crate::{Error, Result};

/// Timed, directed edge between two states.
///
/// `day == 0` marks a recurring transition firing every day at `start`, shifted
/// by `start_time_delta` for every day elapsed since the reference date. Any
/// other `day` fires exactly once, on that day counted from the reference date
/// (day 1 is the reference date itself).
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub start: Time,
    pub duration: Duration,
    pub day: u32,
    pub start_time_delta: Duration,
}

impl Transition {
    pub fn recurring(from: impl Into<String>, to: impl Into<String>, start: Time, duration: Duration) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            start,
            duration,
            day: 0,
            start_time_delta: Duration::zero(),
        }
    }

    pub fn one_off(
        from: impl Into<String>,
        to: impl Into<String>,
        day: u32,
        start: Time,
        duration: Duration,
    ) -> Self {
        Self {
            day,
            ..Self::recurring(from, to, start, duration)
        }
    }

    pub fn with_start_time_delta(mut self, start_time_delta: Duration) -> Self {
        self.start_time_delta = start_time_delta;
        self
    }

    pub fn is_one_off(&self) -> bool {
        self.day != 0
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(Error::InvalidTransition {
                transition: self.to_string(),
                reason: reason.to_owned(),
            })
        };

        if self.from.is_empty() || self.to.is_empty() {
            return invalid("origin and destination must be named");
        }

        if self.duration.is_negative() {
            return invalid("duration must not be negative");
        }

        if self.is_one_off() && !self.start_time_delta.is_zero() {
            return invalid("start-time-delta is only allowed on recurring transitions");
        }

        if !self.is_one_off() && self.period().as_nanos() <= 0 {
            return invalid("start-time-delta must be longer than minus one day");
        }

        Ok(())
    }

    /// Latest firing at or before `reference`. `origin` is the midnight of the
    /// reference date. Firings outside the representable time range never happen.
    pub(crate) fn last_trigger_until(&self, origin: DateTime, reference: DateTime) -> Option<DateTime> {
        if self.is_one_off() {
            return self.one_off_trigger(origin).filter(|trigger| *trigger <= reference);
        }

        self.recurring_trigger(origin, reference, 0)
    }

    /// Earliest firing strictly after `reference`.
    pub(crate) fn next_trigger_after(&self, origin: DateTime, reference: DateTime) -> Option<DateTime> {
        if self.is_one_off() {
            return self.one_off_trigger(origin).filter(|trigger| *trigger > reference);
        }

        self.recurring_trigger(origin, reference, 1)
    }

    pub(crate) fn one_off_trigger(&self, origin: DateTime) -> Option<DateTime> {
        origin
            .checked_add(Duration::days(i64::from(self.day) - 1))?
            .checked_add(self.start.since_midnight())
    }

    // The `skip`-th firing after the last one at or before `reference`.
    fn recurring_trigger(&self, origin: DateTime, reference: DateTime, skip: i128) -> Option<DateTime> {
        let base = origin.checked_add(self.start.since_midnight())?;
        let period = self.period().as_nanos();
        let n = (reference - base).as_nanos().div_euclid(period) + skip;

        base.checked_add(Duration::try_nanos(n * period)?)
    }

    /// Distance between two firings of a recurring transition.
    pub(crate) fn period(&self) -> Duration {
        Duration::days(1) + self.start_time_delta
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}@{}", self.from, self.to, self.start)?;

        if self.is_one_off() {
            write!(f, "[day {}]", self.day)?;
        } else if !self.start_time_delta.is_zero() {
            write!(f, "[{} per day]", self.start_time_delta)?;
        }

        Ok(())
    }
}

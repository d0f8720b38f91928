use std::fmt::Display;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Signed time span. Serialized as ISO 8601 (`PT1H30M`, `-PT5M`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Duration {
    #[serde(with = "duration_format")]
    pub(super) delegate: chrono::Duration,
}

impl Duration {
    pub(super) fn new(delegate: chrono::Duration) -> Self {
        Self { delegate }
    }

    pub fn zero() -> Self {
        Self::new(chrono::Duration::zero())
    }

    pub fn days(days: i64) -> Self {
        Self::new(chrono::Duration::days(days))
    }

    pub fn hours(hours: i64) -> Self {
        Self::new(chrono::Duration::hours(hours))
    }

    pub fn minutes(minutes: i64) -> Self {
        Self::new(chrono::Duration::minutes(minutes))
    }

    pub fn seconds(seconds: i64) -> Self {
        Self::new(chrono::Duration::seconds(seconds))
    }

    pub fn nanos(nanos: i64) -> Self {
        Self::new(chrono::Duration::nanoseconds(nanos))
    }

    /// `None` when `nanos` is out of the range chrono can represent.
    pub fn try_nanos(nanos: i128) -> Option<Self> {
        let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SEC)).ok()?;
        let subsec = i64::try_from(nanos.rem_euclid(NANOS_PER_SEC)).ok()?;

        chrono::Duration::try_seconds(secs)?
            .checked_add(&chrono::Duration::nanoseconds(subsec))
            .map(Self::new)
    }

    pub fn is_zero(&self) -> bool {
        self.delegate == chrono::Duration::zero()
    }

    pub fn is_negative(&self) -> bool {
        self.delegate < chrono::Duration::zero()
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() { -*self } else { *self }
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.as_nanos() as f64 / NANOS_PER_SEC as f64
    }

    /// Exact length in nanoseconds. Does not overflow for any representable duration.
    pub fn as_nanos(&self) -> i128 {
        self.delegate.num_seconds() as i128 * NANOS_PER_SEC + self.delegate.subsec_nanos() as i128
    }

    pub fn to_iso_string(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let total = self.abs().delegate;

        let days = total.num_days();
        let hours = total.num_hours() % 24;
        let minutes = total.num_minutes() % 60;
        let seconds = total.num_seconds() % 60;

        let mut iso = format!("{sign}P");
        if days > 0 {
            iso.push_str(&format!("{days}D"));
        }
        if hours > 0 || minutes > 0 || seconds > 0 || days == 0 {
            iso.push('T');
            if hours > 0 {
                iso.push_str(&format!("{hours}H"));
            }
            if minutes > 0 {
                iso.push_str(&format!("{minutes}M"));
            }
            if seconds > 0 || (days == 0 && hours == 0 && minutes == 0) {
                iso.push_str(&format!("{seconds}S"));
            }
        }
        iso
    }

    pub fn from_iso(value: &str) -> anyhow::Result<Self> {
        let (negative, unsigned) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value),
        };

        let iso_duration = iso8601_duration::Duration::parse(unsigned)
            .map_err(|e| anyhow::anyhow!("Error parsing {} to duration: {:?}", value, e))?;

        let delegate = iso_duration.to_chrono().ok_or_else(|| {
            anyhow::anyhow!(
                "Duration too long. Must not contain years and/or months. Received {}",
                value
            )
        })?;

        Ok(Self::new(if negative { -delegate } else { delegate }))
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::zero()
    }
}

impl Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_iso_string())
    }
}

impl std::ops::Add<Duration> for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Self::Output {
        Self::new(self.delegate + rhs.delegate)
    }
}

impl std::ops::Sub<Duration> for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self::new(self.delegate - rhs.delegate)
    }
}

impl std::ops::Neg for Duration {
    type Output = Duration;

    fn neg(self) -> Self::Output {
        Self::new(-self.delegate)
    }
}

impl From<Duration> for std::time::Duration {
    fn from(val: Duration) -> Self {
        val.abs().delegate.to_std().unwrap_or(std::time::Duration::MAX)
    }
}

mod duration_format {
    use serde::{Deserializer, Serializer, de::Visitor};

    pub fn serialize<S>(duration: &chrono::Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::Duration::new(*duration).to_iso_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<chrono::Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl Visitor<'_> for DurationVisitor {
            type Value = chrono::Duration;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a string representing an ISO 8601 duration (e.g., PT2H30M or -PT5M)")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                super::Duration::from_iso(value)
                    .map(|d| d.delegate)
                    .map_err(|e| E::custom(format!("{e:#}")))
            }
        }

        deserializer.deserialize_str(DurationVisitor)
    }
}

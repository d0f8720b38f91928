use std::fmt::Display;

use anyhow::Context;
use chrono::Timelike;

use super::Duration;

/// Time of day, serialized as `HH:MM` (or `HH:MM:SS` when seconds are set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    pub(super) delegate: chrono::NaiveTime,
}

impl Time {
    pub(super) fn new(delegate: chrono::NaiveTime) -> Self {
        Self { delegate }
    }

    pub fn at(hour: u32, minute: u32) -> anyhow::Result<Self> {
        Ok(Self {
            delegate: chrono::NaiveTime::from_hms_opt(hour, minute, 0)
                .context(format!("Error parsing time {}:{}", hour, minute))?,
        })
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        let delegate = chrono::NaiveTime::parse_from_str(value, "%H:%M")
            .or_else(|_| chrono::NaiveTime::parse_from_str(value, "%H:%M:%S"))
            .with_context(|| format!("Error parsing time of day {value}, expected HH:MM"))?;

        Ok(Self::new(delegate))
    }

    pub fn since_midnight(&self) -> Duration {
        Duration::new(self.delegate - chrono::NaiveTime::MIN)
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.delegate.second() == 0 {
            write!(f, "{}", self.delegate.format("%H:%M"))
        } else {
            write!(f, "{}", self.delegate.format("%H:%M:%S"))
        }
    }
}

impl serde::Serialize for Time {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Time {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Time::parse(&value).map_err(|e| serde::de::Error::custom(format!("{e:#}")))
    }
}

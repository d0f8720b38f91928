use std::path::Path;

use chrono::NaiveDate;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use support::time::{Duration, Time};

use crate::{Catalogue, State, Transition};

/// On-disk form of a catalogue. Loaded from YAML, TOML or JSON, picked by
/// file extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScheduleDocument {
    pub reference_date: NaiveDate,
    pub states: Vec<StateDocument>,
    #[serde(default)]
    pub transitions: Vec<TransitionDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StateDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_light: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_light: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransitionDocument {
    pub from: String,
    pub to: String,
    pub start: Time,
    pub duration: Duration,
    /// 0 or absent for a daily transition
    #[serde(default, skip_serializing_if = "is_recurring")]
    pub day: u32,
    #[serde(default, skip_serializing_if = "Duration::is_zero")]
    pub start_time_delta: Duration,
}

fn is_recurring(day: &u32) -> bool {
    *day == 0
}

impl ScheduleDocument {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading schedule from {}", path.display());

        let document = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;

        Ok(document)
    }

    pub fn parse(content: &str, format: FileFormat) -> anyhow::Result<Self> {
        let document = Config::builder()
            .add_source(File::from_str(content, format))
            .build()?
            .try_deserialize()?;

        Ok(document)
    }

    pub fn into_catalogue(self) -> crate::Result<Catalogue> {
        let states = self.states.into_iter().map(State::from).collect();
        let transitions = self.transitions.into_iter().map(Transition::from).collect();

        Catalogue::new(states, transitions, self.reference_date)
    }
}

impl From<StateDocument> for State {
    fn from(value: StateDocument) -> Self {
        State {
            name: value.name,
            temperature: value.temperature.into(),
            humidity: value.humidity.into(),
            wind: value.wind.into(),
            visible_light: value.visible_light.into(),
            uv_light: value.uv_light.into(),
        }
    }
}

impl From<&State> for StateDocument {
    fn from(value: &State) -> Self {
        StateDocument {
            name: value.name.clone(),
            temperature: value.temperature.into(),
            humidity: value.humidity.into(),
            wind: value.wind.into(),
            visible_light: value.visible_light.into(),
            uv_light: value.uv_light.into(),
        }
    }
}

impl From<TransitionDocument> for Transition {
    fn from(value: TransitionDocument) -> Self {
        Transition {
            from: value.from,
            to: value.to,
            start: value.start,
            duration: value.duration,
            day: value.day,
            start_time_delta: value.start_time_delta,
        }
    }
}

impl From<&Transition> for TransitionDocument {
    fn from(value: &Transition) -> Self {
        TransitionDocument {
            from: value.from.clone(),
            to: value.to.clone(),
            start: value.start,
            duration: value.duration,
            day: value.day,
            start_time_delta: value.start_time_delta,
        }
    }
}

/// Snapshot of a built catalogue, with boundary units already back-filled.
impl From<&Catalogue> for ScheduleDocument {
    fn from(value: &Catalogue) -> Self {
        ScheduleDocument {
            reference_date: value.reference_date(),
            states: value.states().iter().map(StateDocument::from).collect(),
            transitions: value.transitions().map(TransitionDocument::from).collect(),
        }
    }
}

use anyhow::Context;
use climate::{Catalogue, Interpolation, ScheduleDocument, ScheduledClimate, Scheduler, SequentialScheduler, State};
use infrastructure::EventEmitter;
use support::{
    t,
    time::{DateTime, Duration},
};
use tokio_util::sync::CancellationToken;

use crate::settings::ZoneSettings;

/// Rendered climate setpoint of a zone at one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSetpoint {
    pub zone: String,
    pub state: State,
    pub phase: String,
    pub next_change: Option<DateTime>,
}

pub struct ZoneRunner {
    name: String,
    tick_interval: Duration,
    scheduler: SequentialScheduler,
    phase: Option<String>,
    emitter: EventEmitter<ZoneSetpoint>,
}

impl ZoneRunner {
    pub fn new(settings: &ZoneSettings, emitter: EventEmitter<ZoneSetpoint>) -> anyhow::Result<Self> {
        if settings.tick_interval.is_zero() || settings.tick_interval.is_negative() {
            anyhow::bail!("Tick interval of zone {} must be positive", settings.name);
        }

        let catalogue = ScheduleDocument::load(&settings.schedule_file)
            .with_context(|| format!("Error loading schedule {}", settings.schedule_file.display()))?
            .into_catalogue()
            .with_context(|| format!("Invalid schedule {}", settings.schedule_file.display()))?;

        tracing::info!(
            "Zone {} scheduled with {} states from {}",
            settings.name,
            catalogue.states().len(),
            settings.schedule_file.display()
        );

        Ok(Self::with_catalogue(&settings.name, settings.tick_interval, catalogue, emitter))
    }

    pub fn with_catalogue(
        name: &str,
        tick_interval: Duration,
        catalogue: Catalogue,
        emitter: EventEmitter<ZoneSetpoint>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            tick_interval,
            scheduler: SequentialScheduler::new(catalogue),
            phase: None,
            emitter,
        }
    }

    pub fn tick(&mut self, now: DateTime) -> ZoneSetpoint {
        let ScheduledClimate {
            current, next_change, ..
        } = self.scheduler.current_interpolation(now);

        let phase = current.describe();
        if self.phase.as_ref() != Some(&phase) {
            log_phase_change(&self.name, &current, next_change);
            self.phase = Some(phase.clone());
        }

        let setpoint = ZoneSetpoint {
            zone: self.name.clone(),
            state: current.state(now).clamped(),
            phase,
            next_change,
        };

        tracing::debug!("Zone {} at {}: {}", self.name, now, setpoint.state);

        self.emitter.send(setpoint.clone());
        setpoint
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        let mut timer = tokio::time::interval(self.tick_interval.into());

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Stopping zone {}", self.name);
                    break;
                },
                _ = timer.tick() => {
                    self.tick(t!(now));
                },
            }
        }
    }
}

fn log_phase_change(zone: &str, current: &Interpolation, next_change: Option<DateTime>) {
    let until = next_change
        .map(|at| format!("until {} ({})", at, at.to_human_readable()))
        .unwrap_or_else(|| "permanently".to_owned());

    match current {
        Interpolation::Static(state) => {
            tracing::info!("Zone {} holds {} {}", zone, state.name, until)
        }
        Interpolation::Blend { from, to, .. } => {
            tracing::info!("Zone {} blends from {} to {} {}", zone, from.name, to.name, until)
        }
    }
}

use futures::future::join_all;
use infrastructure::{EventBus, EventListener};
use settings::Settings;
use tokio_util::sync::CancellationToken;
use zone::{ZoneRunner, ZoneSetpoint};

mod settings;
mod zone;

#[tokio::main(flavor = "multi_thread")]
pub async fn main() {
    let settings = Settings::new().expect("Error reading configuration");
    settings.monitoring.init().expect("Error initializing monitoring");

    let setpoint_bus = EventBus::new(64);

    let runners: Vec<ZoneRunner> = settings
        .zones
        .iter()
        .filter_map(|zone| match ZoneRunner::new(zone, setpoint_bus.emitter()) {
            Ok(runner) => Some(runner),
            Err(e) => {
                tracing::error!("Skipping zone {}: {:?}", zone.name, e);
                None
            }
        })
        .collect();

    if runners.is_empty() {
        tracing::warn!("No zone with a valid schedule configured");
    }

    let consumer = tokio::spawn(log_setpoints(setpoint_bus.subscribe()));
    //listener closes once the last runner is gone
    drop(setpoint_bus);

    let cancel = CancellationToken::new();

    tracing::info!("Starting {} zone(s)", runners.len());
    let mut tasks: Vec<_> = runners
        .into_iter()
        .map(|runner| tokio::spawn(runner.run(cancel.clone())))
        .collect();
    tasks.push(consumer);

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Error waiting for shutdown signal: {}", e);
    }

    tracing::info!("Shutting down");
    cancel.cancel();

    for result in join_all(tasks).await {
        if let Err(e) = result {
            tracing::error!("Task did not finish cleanly: {}", e);
        }
    }
}

async fn log_setpoints(mut listener: EventListener<ZoneSetpoint>) {
    while let Some(setpoint) = listener.recv().await {
        match setpoint.next_change {
            Some(next_change) => tracing::info!(
                "Setpoint {}: {} (next change {})",
                setpoint.zone,
                setpoint.state,
                next_change
            ),
            None => tracing::info!("Setpoint {}: {}", setpoint.zone, setpoint.state),
        }
    }
}

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, Source};
use infrastructure::MonitoringConfig;
use serde::Deserialize;
use support::{file::find_file_upwards, time::Duration};

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub zones: Vec<ZoneSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZoneSettings {
    pub name: String,
    pub schedule_file: PathBuf,
    #[serde(default = "default_tick_interval")]
    pub tick_interval: Duration,
}

fn default_tick_interval() -> Duration {
    Duration::minutes(1)
}

impl Settings {
    /// Reads `config.toml` from the working directory or the closest parent
    /// holding one. Relative schedule files are taken from the same directory.
    pub fn new() -> Result<Self, ConfigError> {
        let config_file = std::env::current_dir()
            .ok()
            .and_then(|dir| find_file_upwards(&dir, "config.toml"))
            .ok_or_else(|| ConfigError::NotFound("config.toml".to_owned()))?;

        let mut settings = Self::build(File::from(config_file.as_path()))?;
        if let Some(config_dir) = config_file.parent() {
            settings.resolve_schedule_files(config_dir);
        }

        Ok(settings)
    }

    fn resolve_schedule_files(&mut self, config_dir: &Path) {
        for zone in self.zones.iter_mut().filter(|zone| zone.schedule_file.is_relative()) {
            zone.schedule_file = config_dir.join(&zone.schedule_file);
        }
    }

    fn build<S>(source: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(source)
            .add_source(Environment::with_prefix("CLIMATE").separator("__"))
            .build()?
            .try_deserialize()
    }
}

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MonitoringConfig {
    pub service_name: String,
    pub logs: EnvFilterConfig,
    /// One JSON object per line instead of the human readable format
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EnvFilterConfig {
    pub default_level: String,
    #[serde(default)]
    pub filters: Vec<String>,
}

impl TryInto<EnvFilter> for EnvFilterConfig {
    type Error = tracing_subscriber::filter::ParseError;

    fn try_into(self) -> Result<EnvFilter, Self::Error> {
        EnvFilter::builder()
            .with_default_directive(self.default_level.parse()?)
            .parse(self.filters.join(","))
    }
}

impl MonitoringConfig {
    pub fn init(&self) -> anyhow::Result<()> {
        let logging_filter: EnvFilter = self.logs.clone().try_into()?;

        if self.json {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().json())
                .with(logging_filter)
                .try_init()?;
        } else {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer())
                .with(logging_filter)
                .try_init()?;
        }

        tracing::info!("Monitoring initialized for {}", self.service_name);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_config() {
        let config = EnvFilterConfig {
            default_level: "info".to_owned(),
            filters: vec!["climate=trace".to_owned(), "config=warn".to_owned()],
        };

        let filter: Result<EnvFilter, _> = config.try_into();

        assert!(filter.is_ok());
    }

    #[test]
    fn test_invalid_level_in_filter() {
        let config = EnvFilterConfig {
            default_level: "info".to_owned(),
            filters: vec!["climate=extreme".to_owned()],
        };

        let filter: Result<EnvFilter, _> = config.try_into();

        assert!(filter.is_err());
    }
}

use config::{Config, ConfigError, Environment, File};
use infrastructure::{HttpServerConfig, MonitoringConfig};
use serde::Deserialize;

use crate::adapter::csv_log::CsvDataLoggerConfig;
use crate::adapter::pellet_stove::PelletStoveConfig;
use crate::adapter::sensibo::SensiboConfig;
use crate::adapter::smhi::SmhiConfig;
use crate::adapter::tibber::TibberConfig;
use crate::core::resilience::RetryPolicy;
use crate::heating::{CostModelConfig, ScheduleSettings};

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    pub http_server: Option<HttpServerConfig>,
    #[serde(default)]
    pub heating: CostModelConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    pub tibber: TibberConfig,
    pub smhi: SmhiConfig,
    pub sensibo: SensiboConfig,
    pub pellet_stove: PelletStoveConfig,
    #[serde(default)]
    pub data_log: CsvDataLoggerConfig,
}

impl Settings {
    /// `config.toml` is optional; every key can be given or overridden through the environment,
    /// e.g. `HEAT_TIBBER__API_TOKEN`.
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config.toml").required(false))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    #[cfg(test)]
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("HEAT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

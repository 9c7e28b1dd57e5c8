use anyhow::Context as _;
use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use crate::core::time::DateTime;
use crate::core::unit::DegreeCelsius;
use crate::port::TemperatureSource;

//Parameter 1: air temperature, momentary value once per hour
const AIR_TEMPERATURE_PARAMETER: u32 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct SmhiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub station_id: String,
}

fn default_base_url() -> String {
    "https://opendata-download-metobs.smhi.se/api/version/1.0".to_string()
}

impl SmhiConfig {
    pub fn new_temperature_source(&self) -> anyhow::Result<SmhiTemperatureSource> {
        let client = HttpClientConfig::new(None).new_tracing_client()?;

        Ok(SmhiTemperatureSource {
            client,
            url: format!(
                "{}/parameter/{}/station/{}/period/latest-hour/data.json",
                self.base_url.trim_end_matches('/'),
                AIR_TEMPERATURE_PARAMETER,
                self.station_id
            ),
        })
    }
}

/// Outdoor temperature from the latest hourly observation of an SMHI weather station.
#[derive(Debug, Clone)]
pub struct SmhiTemperatureSource {
    client: ClientWithMiddleware,
    url: String,
}

impl TemperatureSource for SmhiTemperatureSource {
    #[tracing::instrument(name = "smhi_outdoor_temperature", skip(self))]
    async fn outdoor_temperature(&self) -> anyhow::Result<DegreeCelsius> {
        let observations = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Error requesting SMHI observations")?
            .error_for_status()?
            .json::<Observations>()
            .await
            .context("Error parsing SMHI observations")?;

        let (temperature, observed_at) = observations.latest()?;
        tracing::info!("Current temperature: {} (observed {})", temperature, observed_at);

        Ok(temperature)
    }
}

#[derive(Debug, Deserialize)]
struct Observations {
    #[serde(default)]
    value: Option<Vec<Observation>>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: i64,
    value: Option<String>,
}

impl Observations {
    //Whole degrees, like the rest of the decision pipeline
    fn latest(self) -> anyhow::Result<(DegreeCelsius, DateTime)> {
        let latest = self
            .value
            .unwrap_or_default()
            .into_iter()
            .filter(|o| o.value.is_some())
            .max_by_key(|o| o.date)
            .context("No temperature observation in SMHI response")?;

        let raw = latest.value.unwrap_or_default();
        let celsius: f64 = raw
            .trim()
            .replace('\u{2212}', "-")
            .parse()
            .with_context(|| format!("Invalid temperature value {:?}", raw))?;
        anyhow::ensure!(celsius.is_finite(), "Invalid temperature value {:?}", raw);

        Ok((
            DegreeCelsius::from(celsius.round() as i32),
            DateTime::from_epoch_millis(latest.date)?,
        ))
    }
}

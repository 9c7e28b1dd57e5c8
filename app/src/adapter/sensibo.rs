use std::time::Duration;

use anyhow::Context as _;
use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::port::DeviceController;

const CONNECTION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Deserialize)]
pub struct SensiboConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: String,
    pub device_id: String,
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_base_url() -> String {
    "https://home.sensibo.com/api/v2".to_string()
}

fn default_mode() -> String {
    "heat".to_string()
}

impl SensiboConfig {
    pub fn new_controller(&self) -> anyhow::Result<SensiboController> {
        if self.api_key.trim().is_empty() || self.device_id.trim().is_empty() {
            anyhow::bail!("Sensibo API key and device id must be set");
        }

        let client = HttpClientConfig::new(None).new_tracing_client()?;

        Ok(SensiboController {
            client,
            url: format!(
                "{}/pods/{}/acStates",
                self.base_url.trim_end_matches('/'),
                self.device_id
            ),
            api_key: self.api_key.clone(),
            mode: self.mode.clone(),
        })
    }
}

/// Heat pump behind a Sensibo air conditioning controller.
#[derive(Debug, Clone)]
pub struct SensiboController {
    client: ClientWithMiddleware,
    url: String,
    api_key: String,
    mode: String,
}

impl SensiboController {
    async fn set_ac_state(&self, ac_state: Value) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.url)
            .query(&[("apiKey", &self.api_key)])
            .json(&json!({ "acState": ac_state }))
            .send()
            .await
            .context("Error sending AC state to Sensibo")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sensibo returned {}: {}", status, body);
        }

        tracing::info!("AC state updated successfully");
        Ok(())
    }
}

impl DeviceController for SensiboController {
    fn name(&self) -> &str {
        "heatpump"
    }

    #[tracing::instrument(name = "sensibo_on", skip(self))]
    async fn turn_on(&self) -> anyhow::Result<()> {
        self.set_ac_state(json!({ "on": true, "mode": self.mode })).await
    }

    #[tracing::instrument(name = "sensibo_off", skip(self))]
    async fn turn_off(&self) -> anyhow::Result<()> {
        self.set_ac_state(json!({ "on": false })).await
    }

    async fn check_connection(&self) -> bool {
        let response = self
            .client
            .get(&self.url)
            .query(&[("apiKey", &self.api_key)])
            .timeout(CONNECTION_CHECK_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(r) => r.status().is_success(),
            Err(e) => {
                tracing::error!("Error checking Sensibo connection: {}", e);
                false
            }
        }
    }
}

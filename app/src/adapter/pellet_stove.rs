use std::time::Duration;

use anyhow::Context as _;
use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::json;

use crate::port::DeviceController;

const CONNECTION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// The stove's vendor portal has no API, so it is bridged into Home Assistant and switched
/// through the HA REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct PelletStoveConfig {
    pub url: String,
    pub token: String,
    pub entity_id: String,
}

impl PelletStoveConfig {
    pub fn new_controller(&self) -> anyhow::Result<PelletStoveController> {
        if self.token.trim().is_empty() || self.entity_id.trim().is_empty() {
            anyhow::bail!("Home Assistant token and pellet stove entity id must be set");
        }

        let client = HttpClientConfig::new(Some(self.token.clone())).new_tracing_client()?;

        Ok(PelletStoveController {
            client,
            base_url: self.url.trim_end_matches('/').to_owned(),
            entity_id: self.entity_id.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PelletStoveController {
    client: ClientWithMiddleware,
    base_url: String,
    entity_id: String,
}

#[derive(Debug, Deserialize)]
struct EntityState {
    state: String,
}

impl PelletStoveController {
    async fn call_service(&self, service: &str) -> anyhow::Result<()> {
        let url = format!("{}/api/services/homeassistant/{}", self.base_url, service);

        tracing::info!("Calling HA service {} for {}", service, self.entity_id);

        let response = self
            .client
            .post(url)
            .json(&json!({ "entity_id": self.entity_id }))
            .send()
            .await
            .with_context(|| format!("Error calling HA service {}", service))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("HA service {} returned {}: {}", service, status, body);
        }

        Ok(())
    }

    async fn current_state(&self) -> anyhow::Result<String> {
        let entity = self
            .client
            .get(format!("{}/api/states/{}", self.base_url, self.entity_id))
            .timeout(CONNECTION_CHECK_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json::<EntityState>()
            .await?;

        Ok(entity.state)
    }
}

impl DeviceController for PelletStoveController {
    fn name(&self) -> &str {
        "pelletstove"
    }

    #[tracing::instrument(name = "pellet_stove_on", skip(self))]
    async fn turn_on(&self) -> anyhow::Result<()> {
        self.call_service("turn_on").await
    }

    #[tracing::instrument(name = "pellet_stove_off", skip(self))]
    async fn turn_off(&self) -> anyhow::Result<()> {
        self.call_service("turn_off").await
    }

    async fn check_connection(&self) -> bool {
        match self.current_state().await {
            Ok(state) => is_available(&state),
            Err(e) => {
                tracing::error!("Error checking pellet stove connection: {:?}", e);
                false
            }
        }
    }
}

fn is_available(state: &str) -> bool {
    !matches!(state, "unavailable" | "unknown")
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};

    use super::*;

    const ENTITY: &str = "switch.pellet_stove";

    fn controller(url: String) -> PelletStoveController {
        PelletStoveConfig {
            url,
            token: "ha_token".to_string(),
            entity_id: ENTITY.to_string(),
        }
        .new_controller()
        .unwrap()
    }

    #[tokio::test]
    async fn turn_on_calls_home_assistant_service() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/services/homeassistant/turn_on")
            .match_header("authorization", "Bearer ha_token")
            .match_body(Matcher::Json(json!({ "entity_id": ENTITY })))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let result = controller(server.url()).turn_on().await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn turn_off_calls_home_assistant_service() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/services/homeassistant/turn_off")
            .match_header("authorization", "Bearer ha_token")
            .match_body(Matcher::Json(json!({ "entity_id": ENTITY })))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let result = controller(server.url()).turn_off().await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/services/homeassistant/turn_on")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let result = controller(server.url()).turn_on().await;

        assert!(result.unwrap_err().to_string().contains("500"));
        mock.assert_async().await;
    }

    async fn entity_state_server(status: usize, state: &str) -> (mockito::ServerGuard, mockito::Mock) {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", format!("/api/states/{ENTITY}").as_str())
            .match_header("authorization", "Bearer ha_token")
            .with_status(status)
            .with_body(json!({ "entity_id": ENTITY, "state": state }).to_string())
            .create_async()
            .await;

        (server, mock)
    }

    #[tokio::test]
    async fn entity_with_state_is_connected() {
        let (server, mock) = entity_state_server(200, "off").await;

        assert!(controller(server.url()).check_connection().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unavailable_entity_state_is_not_connected() {
        let (server, mock) = entity_state_server(200, "unavailable").await;

        assert!(!controller(server.url()).check_connection().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_entity_is_not_connected() {
        let (server, mock) = entity_state_server(404, "").await;

        assert!(!controller(server.url()).check_connection().await);
        mock.assert_async().await;
    }

    #[test]
    fn state_strings_reported_as_unavailable() {
        assert!(is_available("on"));
        assert!(is_available("off"));
        assert!(!is_available("unavailable"));
        assert!(!is_available("unknown"));
    }

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let controller = controller("http://homeassistant.local:8123/".to_string());

        assert_eq!(controller.base_url, "http://homeassistant.local:8123");
        assert_eq!(controller.name(), "pelletstove");
    }

    #[test]
    fn blank_token_fails_at_startup() {
        let config = PelletStoveConfig {
            url: "http://homeassistant.local:8123".to_string(),
            token: " ".to_string(),
            entity_id: ENTITY.to_string(),
        };

        assert!(config.new_controller().is_err());
    }
}

use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::{self, HeaderMap};
use reqwest_middleware::ClientWithMiddleware;
use reqwest_tracing::TracingMiddleware;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct HttpClientConfig {
    bearer_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl HttpClientConfig {
    pub fn new(bearer_token: Option<String>) -> Self {
        Self {
            bearer_token,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn new_tracing_client(&self) -> anyhow::Result<ClientWithMiddleware> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &self.bearer_token {
            let mut auth_value = header::HeaderValue::from_str(format!("Bearer {}", token).as_str())
                .context("Bearer token contains characters not allowed in an HTTP header")?;
            auth_value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, auth_value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        Ok(reqwest_middleware::ClientBuilder::new(client)
            .with(TracingMiddleware::default())
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_token_with_newline() {
        let config = HttpClientConfig::new(Some("abc\ndef".to_string()));

        assert!(config.new_tracing_client().is_err());
    }

    #[test]
    fn builds_client_without_token() {
        let config = HttpClientConfig::new(None);

        assert_eq!(config.timeout_secs, 10);
        assert!(config.new_tracing_client().is_ok());
    }
}

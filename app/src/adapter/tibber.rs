use anyhow::Context as _;
use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use crate::core::time::DateTime;
use crate::core::unit::SpotPrice;
use crate::heating::Quote;
use crate::port::PriceSource;
use crate::t;

const PRICE_QUERY: &str = r#"{
  viewer {
    homes {
      currentSubscription {
        priceInfo {
          current {
            total
            energy
            tax
            startsAt
          }
        }
      }
    }
  }
}"#;

#[derive(Debug, Clone, Deserialize)]
pub struct TibberConfig {
    #[serde(default = "default_url")]
    pub url: String,
    pub api_token: String,
}

fn default_url() -> String {
    "https://api.tibber.com/v1-beta/gql".to_string()
}

impl TibberConfig {
    pub fn new_price_source(&self) -> anyhow::Result<TibberPriceSource> {
        if self.api_token.trim().is_empty() {
            anyhow::bail!("Tibber API token is not set");
        }

        let client = HttpClientConfig::new(Some(self.api_token.clone())).new_tracing_client()?;

        Ok(TibberPriceSource {
            client,
            url: self.url.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TibberPriceSource {
    client: ClientWithMiddleware,
    url: String,
}

impl PriceSource for TibberPriceSource {
    #[tracing::instrument(name = "tibber_current_price", skip(self))]
    async fn current_quote(&self) -> anyhow::Result<Quote> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "query": PRICE_QUERY }))
            .send()
            .await
            .context("Error making request to Tibber API")?
            .error_for_status()?;

        let body = response
            .json::<GraphQlResponse>()
            .await
            .context("Error parsing Tibber response")?;

        let current = body.current_price()?;
        tracing::info!(
            energy = ?current.energy,
            tax = ?current.tax,
            starts_at = ?current.starts_at,
            "Total price: {}",
            current.total
        );

        Ok(Quote {
            spot_price: SpotPrice(current.total),
            fetched_at: t!(now),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ViewerData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Viewer,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    #[serde(default)]
    homes: Vec<Home>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Home {
    current_subscription: Option<Subscription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Subscription {
    price_info: Option<PriceInfo>,
}

#[derive(Debug, Deserialize)]
struct PriceInfo {
    current: Option<CurrentPrice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentPrice {
    total: Option<f64>,
    energy: Option<f64>,
    tax: Option<f64>,
    starts_at: Option<DateTime>,
}

#[derive(Debug, PartialEq)]
struct PriceComponents {
    total: f64,
    energy: Option<f64>,
    tax: Option<f64>,
    starts_at: Option<DateTime>,
}

impl GraphQlResponse {
    //First home with a current total wins
    fn current_price(self) -> anyhow::Result<PriceComponents> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            anyhow::bail!("Tibber API returned errors: {}", messages.join("; "));
        }

        let homes = self.data.map(|d| d.viewer.homes).unwrap_or_default();
        if homes.is_empty() {
            anyhow::bail!("No homes found in Tibber response");
        }

        homes
            .into_iter()
            .filter_map(|home| home.current_subscription?.price_info?.current)
            .find_map(|current| {
                current.total.map(|total| PriceComponents {
                    total,
                    energy: current.energy,
                    tax: current.tax,
                    starts_at: current.starts_at,
                })
            })
            .context("Could not determine total price from any home")
    }
}

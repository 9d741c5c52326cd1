//! HTTP exchange rate providers.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use pulse_core::{ExchangeRateProvider, FetchError, PulseError, PulseResult};

use crate::constants::{FRANKFURTER_URL, OPEN_ER_API_URL, RATE_USER_AGENT};

/// Response shape shared by both providers: `{"rates": {"USD": 0.73, ...}}`.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Extract the USD quote from a provider response body.
pub fn parse_usd_rate(body: &str, provider: &str) -> Result<f64, FetchError> {
    let payload: RatesResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed {
            source_name: provider.to_string(),
            reason: format!("JSON parse error: {}", e),
        })?;
    payload
        .rates
        .get("USD")
        .copied()
        .ok_or_else(|| FetchError::Malformed {
            source_name: provider.to_string(),
            reason: "response has no rates.USD".to_string(),
        })
}

/// CAD to USD quote fetched from a JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    client: reqwest::Client,
    name: String,
    url: String,
    timeout: Duration,
}

impl HttpRateProvider {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
    ) -> PulseResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(RATE_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| PulseError::Init {
                reason: format!("Failed to build rate HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            name: name.into(),
            url: url.into(),
            timeout,
        })
    }

    /// api.frankfurter.app, the primary provider.
    pub fn frankfurter(timeout: Duration) -> PulseResult<Self> {
        Self::new("frankfurter", FRANKFURTER_URL, timeout)
    }

    /// open.er-api.com, the fallback provider.
    pub fn open_er_api(timeout: Duration) -> PulseResult<Self> {
        Self::new("open-er-api", OPEN_ER_API_URL, timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ExchangeRateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rate(&self) -> Result<f64, FetchError> {
        debug!(provider = %self.name, url = %self.url, "Fetching CAD to USD rate");

        let resp = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    source_name: self.name.clone(),
                    after: self.timeout,
                }
            } else {
                FetchError::Connection {
                    source_name: self.name.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            return Err(FetchError::Query {
                source_name: self.name.clone(),
                reason: format!("HTTP {}: {}", status.as_u16(), excerpt),
            });
        }

        let body = resp.text().await.map_err(|e| FetchError::Malformed {
            source_name: self.name.clone(),
            reason: format!("reading body: {}", e),
        })?;
        parse_usd_rate(&body, &self.name)
    }
}

/// Providers in the order they are tried.
pub fn default_rate_providers(
    timeout: Duration,
) -> PulseResult<Vec<Arc<dyn ExchangeRateProvider>>> {
    let primary: Arc<dyn ExchangeRateProvider> = Arc::new(HttpRateProvider::frankfurter(timeout)?);
    let fallback: Arc<dyn ExchangeRateProvider> = Arc::new(HttpRateProvider::open_er_api(timeout)?);
    Ok(vec![primary, fallback])
}

//! HTTP client for the reputation aggregator.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use repu_core::{ProviderId, Reputation};

use crate::error::ClientError;
use crate::source::ReputationSource;

/// Reputation client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the reputation service.
    pub base_url: String,

    /// Upper bound for a single request, including connect.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://reputation.dev.golem.network".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Body of `GET /standard_score/{role}/{node_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScore {
    /// Score as sent by the service: a decimal string, a number, or null.
    #[serde(default)]
    pub score: Option<Value>,
}

impl StandardScore {
    /// Interpret the raw score. Anything unparsable means "unknown".
    pub fn reputation(&self) -> Reputation {
        let parsed = match &self.score {
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(Value::Number(n)) => n.as_f64(),
            _ => None,
        };
        Reputation::from(parsed)
    }
}

/// HTTP client for the reputation service.
#[derive(Debug, Clone)]
pub struct ReputationClient {
    inner: reqwest::Client,
    base_url: String,
}

impl ReputationClient {
    /// Create a new client.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let inner = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client with default settings for the given base URL.
    pub fn with_url(base_url: &str) -> Result<Self, ClientError> {
        Self::new(&ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the standard score of a provider.
    pub async fn standard_score(
        &self,
        provider_id: &ProviderId,
    ) -> Result<Reputation, ClientError> {
        let url = format!("{}/standard_score/provider/{}", self.base_url, provider_id);
        debug!(url = %url, "GET standard score");

        let response = self.inner.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let body: StandardScore = response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))?;

        Ok(body.reputation())
    }
}

#[async_trait]
impl ReputationSource for ReputationClient {
    async fn reputation(&self, provider_id: &ProviderId) -> Reputation {
        match self.standard_score(provider_id).await {
            Ok(reputation) => {
                debug!(provider_id = %provider_id, reputation = ?reputation, "Reputation fetched");
                reputation
            }
            Err(e) => {
                warn!(
                    provider_id = %provider_id,
                    error = %e,
                    "Reputation unavailable, treating provider as unknown"
                );
                Reputation::Unknown
            }
        }
    }
}

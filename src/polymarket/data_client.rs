use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{ApiActivity, ApiPosition};
use super::MarketDataApi;

const DATA_API_BASE: &str = "https://data-api.polymarket.com";

#[derive(Debug, Error)]
pub enum DataClientError {
    /// HTTP 429 — the poller backs off on this.
    #[error("rate limited by upstream (429)")]
    RateLimited,

    /// HTTP 404 — a trader with no activity yet, not an error.
    #[error("no data for this address (404)")]
    NotFound,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl DataClientError {
    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => DataClientError::RateLimited,
            StatusCode::NOT_FOUND => DataClientError::NotFound,
            other => DataClientError::Unexpected(format!("status {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataClient {
    http: Client,
    base_url: String,
}

impl DataClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: DATA_API_BASE.into(),
        }
    }

    pub fn with_base_url(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl MarketDataApi for DataClient {
    async fn get_activity(&self, trader: &str) -> Result<Vec<ApiActivity>, DataClientError> {
        let url = format!("{}/activity", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("user", trader)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(DataClientError::from_status(resp.status()));
        }

        let activities: Vec<ApiActivity> = resp.json().await?;
        Ok(activities)
    }

    async fn get_positions(&self, address: &str) -> Result<Vec<ApiPosition>, DataClientError> {
        let url = format!("{}/positions", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("user", address)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(DataClientError::from_status(resp.status()));
        }

        let positions: Vec<ApiPosition> = resp.json().await?;
        Ok(positions)
    }

    async fn get_usdc_balance(&self, address: &str) -> Result<Decimal, DataClientError> {
        let url = format!("{}/balance", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("user", address)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(DataClientError::from_status(resp.status()));
        }

        // The balance payload has shipped under a couple of field names.
        let body: serde_json::Value = resp.json().await?;
        let balance = body
            .get("balance")
            .or_else(|| body.get("available"))
            .and_then(|v| {
                v.as_str()
                    .and_then(|s| s.parse::<Decimal>().ok())
                    .or_else(|| v.as_f64().and_then(|f| Decimal::try_from(f).ok()))
            })
            .ok_or_else(|| DataClientError::Unexpected(format!("no balance field in {body}")))?;

        Ok(balance)
    }
}

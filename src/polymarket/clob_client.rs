use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use thiserror::Error;

use super::auth::ClobAuth;
use super::types::{ApiOrder, OrderAck, OrderRequest};
use super::ExchangeApi;

const CLOB_API_BASE: &str = "https://clob.polymarket.com";

#[derive(Debug, Error)]
pub enum ClobClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication error: {0}")]
    Auth(#[from] super::auth::AuthError),

    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl ClobClientError {
    /// The exchange's "not enough balance / allowance" rejection, surfaced
    /// so the submitter can log an actionable balance warning.
    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, ClobClientError::Rejected(msg)
            if msg.contains("not enough balance / allowance"))
    }
}

#[derive(Debug, Clone)]
pub struct ClobClient {
    http: Client,
    auth: ClobAuth,
    base_url: String,
}

impl ClobClient {
    pub fn new(http: Client, auth: ClobAuth) -> Self {
        Self {
            http,
            auth,
            base_url: CLOB_API_BASE.into(),
        }
    }

    pub fn with_base_url(http: Client, auth: ClobAuth, base_url: String) -> Self {
        Self {
            http,
            auth,
            base_url,
        }
    }

    /// Build an authenticated request with HMAC signature headers.
    fn authenticated(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &str,
    ) -> Result<RequestBuilder, ClobClientError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.auth.sign(&timestamp, method.as_str(), path, body)?;

        let url = format!("{}{}", self.base_url, path);
        let req = self
            .http
            .request(method, &url)
            .header("POLY-API-KEY", &self.auth.api_key)
            .header("POLY-SIGNATURE", signature)
            .header("POLY-TIMESTAMP", &timestamp)
            .header("POLY-PASSPHRASE", &self.auth.passphrase);

        Ok(req)
    }
}

#[async_trait]
impl ExchangeApi for ClobClient {
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderAck, ClobClientError> {
        let body = serde_json::to_string(request)
            .map_err(|e| ClobClientError::Unexpected(e.to_string()))?;

        let resp = self
            .authenticated(reqwest::Method::POST, "/order", &body)?
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ClobClientError::Rejected(format!("{status}: {text}")));
        }

        let ack: OrderAck = resp.json().await?;
        if !ack.success {
            return Err(ClobClientError::Rejected(
                ack.error_msg.unwrap_or_else(|| "submission not accepted".into()),
            ));
        }
        Ok(ack)
    }

    async fn get_order(&self, order_id: &str) -> Result<ApiOrder, ClobClientError> {
        let path = format!("/data/order/{order_id}");
        let resp = self
            .authenticated(reqwest::Method::GET, &path, "")?
            .send()
            .await?
            .error_for_status()?;

        let order: ApiOrder = resp.json().await?;
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), ClobClientError> {
        let body = serde_json::json!({ "orderID": order_id }).to_string();
        self.authenticated(reqwest::Method::DELETE, "/order", &body)?
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        tracing::info!(order_id, "Order cancelled on CLOB");
        Ok(())
    }
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use copybot::polymarket::types::{ApiActivity, ApiOrder, ApiPosition, OrderAck, OrderRequest};
use copybot::polymarket::{ClobClientError, DataClientError, ExchangeApi, MarketDataApi};

// ---------------------------------------------------------------------------
// In-memory Market Data API
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeDataApi {
    pub activity: Mutex<HashMap<String, Vec<ApiActivity>>>,
    pub balances: Mutex<HashMap<String, Decimal>>,
    pub positions: Mutex<HashMap<String, Vec<ApiPosition>>>,
    pub call_count: AtomicUsize,
}

impl FakeDataApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, address: &str, balance: Decimal) {
        self.balances
            .lock()
            .unwrap()
            .insert(address.to_lowercase(), balance);
    }

    pub fn set_position(&self, address: &str, token_id: &str, shares: Decimal, cur_price: Decimal) {
        let position: ApiPosition = serde_json::from_value(serde_json::json!({
            "asset": token_id,
            "size": shares.to_string(),
            "avgPrice": cur_price.to_string(),
            "curPrice": cur_price.to_string(),
        }))
        .unwrap();
        self.positions
            .lock()
            .unwrap()
            .entry(address.to_lowercase())
            .or_default()
            .push(position);
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataApi for FakeDataApi {
    async fn get_activity(&self, trader: &str) -> Result<Vec<ApiActivity>, DataClientError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .activity
            .lock()
            .unwrap()
            .get(&trader.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn get_positions(&self, address: &str) -> Result<Vec<ApiPosition>, DataClientError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .positions
            .lock()
            .unwrap()
            .get(&address.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn get_usdc_balance(&self, address: &str) -> Result<Decimal, DataClientError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.balances
            .lock()
            .unwrap()
            .get(&address.to_lowercase())
            .copied()
            .ok_or(DataClientError::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Scripted exchange
// ---------------------------------------------------------------------------

pub struct FakeExchange {
    pub submitted: Mutex<Vec<OrderRequest>>,
    pub cancelled: Mutex<Vec<String>>,
    /// Status string returned by every submission ack.
    pub ack_status: Mutex<String>,
    /// Status string returned by every order status check.
    pub order_status: Mutex<String>,
    next_id: AtomicUsize,
}

impl Default for FakeExchange {
    fn default() -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            ack_status: Mutex::new("live".into()),
            order_status: Mutex::new("OPEN".into()),
            next_id: AtomicUsize::new(1),
        }
    }
}

impl FakeExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acking_with(status: &str) -> Self {
        let fake = Self::default();
        *fake.ack_status.lock().unwrap() = status.into();
        fake
    }

    pub fn set_order_status(&self, status: &str) {
        *self.order_status.lock().unwrap() = status.into();
    }

    pub fn submissions(&self) -> Vec<OrderRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeApi for FakeExchange {
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderAck, ClobClientError> {
        self.submitted.lock().unwrap().push(request.clone());
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let status = self.ack_status.lock().unwrap().clone();
        Ok(serde_json::from_value(serde_json::json!({
            "success": true,
            "orderID": format!("order-{id}"),
            "status": status,
        }))
        .map_err(|e| ClobClientError::Unexpected(e.to_string()))?)
    }

    async fn get_order(&self, order_id: &str) -> Result<ApiOrder, ClobClientError> {
        let status = self.order_status.lock().unwrap().clone();
        Ok(serde_json::from_value(serde_json::json!({
            "id": order_id,
            "status": status,
            "filledSize": "0",
        }))
        .map_err(|e| ClobClientError::Unexpected(e.to_string()))?)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), ClobClientError> {
        self.cancelled.lock().unwrap().push(order_id.to_string());
        Ok(())
    }
}

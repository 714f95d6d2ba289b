use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Side;

// ---------------------------------------------------------------------------
// Activity feed (Data API)
// ---------------------------------------------------------------------------

/// One record from the per-trader activity feed. Field presence varies
/// between feed versions, so everything beyond `type` is optional; the
/// poller's normalizer decides what is fatal.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiActivity {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub condition_id: Option<String>,
    pub asset: Option<String>,
    pub side: Option<String>,
    pub size: Option<Decimal>,
    pub price: Option<Decimal>,
    pub usdc_size: Option<Decimal>,
    /// Epoch seconds, epoch millis, or an RFC3339 string depending on the
    /// feed version.
    pub timestamp: Option<serde_json::Value>,
    pub transaction_hash: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub outcome: Option<String>,
}

// ---------------------------------------------------------------------------
// Positions / balances (Data API)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPosition {
    /// Token ID; older feed versions call this `token_id`.
    #[serde(alias = "token_id")]
    pub asset: Option<String>,
    pub condition_id: Option<String>,
    #[serde(default)]
    pub size: Option<Decimal>,
    #[serde(default, alias = "avg_price")]
    pub avg_price: Option<Decimal>,
    #[serde(default, alias = "cur_price")]
    pub cur_price: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Orders (CLOB API)
// ---------------------------------------------------------------------------

/// Limit (GTC) vs marketable (FOK) — dust liquidations go out as FOK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Gtc,
    Fok,
}

/// Order payload submitted to the CLOB.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub token_id: String,
    pub side: Side,
    pub price: Decimal,
    /// Share count (not notional).
    pub size: Decimal,
    pub order_type: OrderType,
    pub client_order_id: String,
}

/// Submission acknowledgement from the CLOB.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "orderID", alias = "orderId")]
    pub order_id: Option<String>,
    pub status: Option<String>,
    /// Shares matched on arrival; > 0 means the order was marketable.
    #[serde(default)]
    pub taking_amount: Option<Decimal>,
    #[serde(default, rename = "errorMsg")]
    pub error_msg: Option<String>,
}

/// Order status as reported by the CLOB.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOrder {
    pub id: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub size: Option<Decimal>,
    #[serde(default)]
    pub filled_size: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Side;

/// Order lifecycle state. Transitions are monotonic: once an order reaches
/// `Filled`, `Cancelled`, or `Expired` it never moves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Pending,
    PartialFilled,
    Filled,
    Cancelled,
    Expired,
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderState::Filled | OrderState::Cancelled | OrderState::Expired
        )
    }

    /// Map a CLOB status string onto our state machine. Unknown statuses
    /// return `None` and are treated as transient by the caller.
    pub fn from_exchange_status(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" | "LIVE" => Some(OrderState::Pending),
            "PARTIAL_FILLED" => Some(OrderState::PartialFilled),
            "FILLED" | "MATCHED" => Some(OrderState::Filled),
            "CANCELLED" | "CANCELED" => Some(OrderState::Cancelled),
            "EXPIRED" => Some(OrderState::Expired),
            _ => None,
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderState::Pending => "pending",
            OrderState::PartialFilled => "partial_filled",
            OrderState::Filled => "filled",
            OrderState::Cancelled => "cancelled",
            OrderState::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

/// A submitted copy order tracked by the lifecycle manager.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub order_id: String,
    pub token_id: String,
    pub side: Side,
    /// Notional we asked for, in USDC.
    pub requested_notional: Decimal,
    /// Shares requested (`requested_notional / price`) — upper bound for fills.
    pub requested_shares: Decimal,
    /// Shares confirmed filled so far.
    pub filled_amount: Decimal,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub status: OrderState,
    pub expires_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn new(
        order_id: String,
        token_id: String,
        side: Side,
        requested_notional: Decimal,
        requested_shares: Decimal,
        price: Decimal,
        timeout_secs: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            token_id,
            side,
            requested_notional,
            requested_shares,
            filled_amount: Decimal::ZERO,
            price,
            created_at: now,
            status: OrderState::Pending,
            expires_at: now + chrono::Duration::seconds(timeout_secs),
        }
    }

    /// Apply a state transition. Returns `false` (and leaves the record
    /// untouched) if the order is already terminal.
    pub fn transition(&mut self, next: OrderState) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = next;
        true
    }

    /// Record the filled share count, clamped to the requested shares.
    pub fn record_fill(&mut self, filled: Decimal) {
        self.filled_amount = filled.min(self.requested_shares).max(Decimal::ZERO);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

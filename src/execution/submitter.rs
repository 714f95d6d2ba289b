use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::Side;
use crate::polymarket::types::OrderRequest;
use crate::polymarket::{ClobClientError, ExchangeApi};

use super::sizer::{OrderPlan, MIN_ORDER_NOTIONAL, MIN_ORDER_SHARES};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("order failed pre-submission guard: {0}")]
    GuardFailed(&'static str),

    #[error(transparent)]
    Exchange(#[from] ClobClientError),
}

/// What the exchange told us on acceptance.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub order_id: String,
    pub immediately_filled: bool,
}

pub struct OrderSubmitter {
    exchange: Arc<dyn ExchangeApi>,
}

impl OrderSubmitter {
    pub fn new(exchange: Arc<dyn ExchangeApi>) -> Self {
        Self { exchange }
    }

    /// Submit a sized order. Guards replicate the exchange's own rejection
    /// rules so a doomed order never spends a signed request.
    pub async fn submit(
        &self,
        plan: &OrderPlan,
        client_order_id: String,
    ) -> Result<SubmitOutcome, SubmitError> {
        check_guards(plan)?;

        let request = OrderRequest {
            token_id: plan.token_id.clone(),
            side: plan.side,
            price: plan.price,
            size: plan.shares,
            order_type: plan.order_type,
            client_order_id,
        };

        tracing::info!(
            token_id = %plan.token_id,
            side = %plan.side,
            price = %plan.price,
            shares = %plan.shares,
            notional = %plan.notional,
            "Submitting order"
        );

        let ack = match self.exchange.submit_order(&request).await {
            Ok(ack) => ack,
            Err(e) => {
                if e.is_insufficient_balance() {
                    tracing::error!(
                        token_id = %plan.token_id,
                        notional = %plan.notional,
                        "Order rejected for insufficient balance/allowance — wallet needs funding or approval"
                    );
                }
                counter!("orders_rejected").increment(1);
                return Err(e.into());
            }
        };

        let order_id = ack
            .order_id
            .ok_or(ClobClientError::Unexpected("ack without order id".into()))?;

        let immediately_filled = ack
            .status
            .as_deref()
            .map(|s| {
                let s = s.to_ascii_uppercase();
                s == "MATCHED" || s == "FILLED"
            })
            .unwrap_or(false)
            || ack.taking_amount.map(|t| t > Decimal::ZERO).unwrap_or(false);

        counter!("orders_submitted").increment(1);
        tracing::info!(order_id = %order_id, immediately_filled, "Order accepted");

        Ok(SubmitOutcome {
            order_id,
            immediately_filled,
        })
    }
}

fn check_guards(plan: &OrderPlan) -> Result<(), SubmitError> {
    if plan.price < Decimal::new(1, 3) || plan.price > Decimal::new(99, 2) {
        return Err(SubmitError::GuardFailed("price outside [0.001, 0.99]"));
    }

    if plan.side == Side::Buy {
        // Allow one tick of quantization slack under the 5-share floor.
        let tolerance = Decimal::new(1, 3);
        if plan.shares < MIN_ORDER_SHARES - tolerance {
            return Err(SubmitError::GuardFailed("buy below 5-share minimum"));
        }
        if plan.notional < MIN_ORDER_NOTIONAL {
            return Err(SubmitError::GuardFailed("buy below $1 minimum notional"));
        }
    }

    Ok(())
}

/// Client order id carried on every submission: `copy_{unix_ts}_{hash8}`.
pub fn client_order_id(tx_hash: &str, now_ts: i64) -> String {
    let tail: String = tx_hash
        .trim_start_matches("0x")
        .chars()
        .take(8)
        .collect();
    format!("copy_{now_ts}_{tail}")
}

/// Convenience for callers that want "now".
pub fn client_order_id_now(tx_hash: &str) -> String {
    client_order_id(tx_hash, Utc::now().timestamp())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

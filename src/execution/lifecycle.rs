use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;

use crate::models::{OrderRecord, OrderState};
use crate::polymarket::ExchangeApi;
use crate::services::{PipelineStats, SnapshotStore};

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub check_interval: Duration,
    pub order_timeout: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(10),
            order_timeout: Duration::from_secs(300),
        }
    }
}

/// Follow one order to a terminal state, then refresh snapshots.
///
/// Polls the exchange on a fixed interval; a transient fetch error keeps the
/// current state and retries. An order still open at the timeout is
/// cancelled and marked `Cancelled`. Whatever the outcome, the balance and
/// position snapshots refresh exactly once at the end so the next signal
/// sizes against post-trade state.
pub async fn manage_order(
    exchange: Arc<dyn ExchangeApi>,
    snapshots: Arc<SnapshotStore>,
    stats: Arc<PipelineStats>,
    mut record: OrderRecord,
    trader: String,
    config: LifecycleConfig,
) -> OrderRecord {
    let deadline = tokio::time::Instant::now() + config.order_timeout;

    while !record.status.is_terminal() {
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!(
                order_id = %record.order_id,
                timeout_secs = config.order_timeout.as_secs(),
                "Order unfilled at timeout — cancelling"
            );
            if let Err(e) = exchange.cancel_order(&record.order_id).await {
                tracing::error!(order_id = %record.order_id, error = %e, "Cancel request failed");
            }
            record.transition(OrderState::Cancelled);
            break;
        }

        sleep(config.check_interval).await;

        match exchange.get_order(&record.order_id).await {
            Ok(order) => {
                if let Some(filled) = order.filled_size {
                    record.record_fill(filled);
                }
                match order.status.as_deref().and_then(OrderState::from_exchange_status) {
                    Some(next) if next != record.status => {
                        record.transition(next);
                        tracing::info!(
                            order_id = %record.order_id,
                            status = %record.status,
                            filled = %record.filled_amount,
                            "Order status changed"
                        );
                    }
                    Some(_) => {}
                    None => {
                        tracing::warn!(
                            order_id = %record.order_id,
                            status = ?order.status,
                            "Unknown exchange status — keeping current state"
                        );
                    }
                }
            }
            Err(e) => {
                // Transient: keep the current state and poll again.
                tracing::warn!(order_id = %record.order_id, error = %e, "Status check failed");
            }
        }
    }

    match record.status {
        OrderState::Filled | OrderState::PartialFilled => stats.order_filled(),
        _ => stats.order_cancelled(),
    }

    tracing::info!(
        order_id = %record.order_id,
        status = %record.status,
        filled = %record.filled_amount,
        elapsed_secs = (Utc::now() - record.created_at).num_seconds(),
        "Order lifecycle complete — refreshing snapshots"
    );

    snapshots.refresh_after_trade(&trader).await;
    record
}

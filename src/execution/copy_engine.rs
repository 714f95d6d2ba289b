use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::models::{OrderRecord, OrderState, Side, TradeSignal};
use crate::polymarket::ExchangeApi;
use crate::services::{PipelineStats, SnapshotStore};

use super::lifecycle::{manage_order, LifecycleConfig};
use super::pricing::PricingEngine;
use super::queue::QueueItem;
use super::sizer::{OrderSizer, SizingInputs};
use super::submitter::{client_order_id_now, OrderSubmitter};
use super::validator::SignalValidator;

/// Everything the engine loop needs, wired once at startup.
pub struct EngineContext {
    pub validator: SignalValidator,
    pub pricing: PricingEngine,
    pub sizer: OrderSizer,
    pub submitter: OrderSubmitter,
    pub exchange: Arc<dyn ExchangeApi>,
    pub snapshots: Arc<SnapshotStore>,
    pub stats: Arc<PipelineStats>,
    pub lifecycle: LifecycleConfig,
}

/// Single-consumer execution loop: signals are processed strictly in arrival
/// order, one at a time, so sizing for signal N+1 always sees the snapshot
/// refresh requested by signal N's submission path.
pub async fn run_copy_engine(mut rx: UnboundedReceiver<QueueItem>, mut ctx: EngineContext) {
    tracing::info!("Copy engine started");

    while let Some(item) = rx.recv().await {
        match item {
            QueueItem::Signal(signal) => {
                process_signal(&mut ctx, *signal).await;
            }
            QueueItem::Stop => {
                tracing::info!("Stop received — draining execution queue");
                break;
            }
        }
    }

    tracing::info!(
        stats = ?ctx.stats.snapshot(),
        "Copy engine stopped"
    );
}

async fn process_signal(ctx: &mut EngineContext, signal: TradeSignal) {
    let tx_hash = signal.original_tx_hash.clone();
    let trader = signal.source_trader.clone();

    if let Err(e) = ctx.validator.validate(&signal, Utc::now()) {
        tracing::info!(tx_hash = %tx_hash, reason = %e, "Signal rejected");
        ctx.stats.signal_rejected();
        counter!("signals_rejected").increment(1);
        return;
    }

    // Price off the trader's fill; a SELL with no derivable price falls back
    // to our cached mark for the token.
    let price = match ctx.pricing.price_from_signal(&signal) {
        Some(p) => Some(p),
        None if signal.side == Side::Sell => {
            match ctx.snapshots.cached_price(&signal.token_id).await {
                Some(mark) => ctx.pricing.price_from_reference(Side::Sell, mark),
                None => None,
            }
        }
        None => None,
    };
    let Some(price) = price else {
        tracing::info!(tx_hash = %tx_hash, side = %signal.side, "No safe price — signal skipped");
        ctx.stats.signal_rejected();
        counter!("signals_rejected").increment(1);
        return;
    };

    let inputs = SizingInputs {
        our_balance: ctx.snapshots.our_balance().await,
        trader_balance: ctx.snapshots.trader_balance(&trader).await,
        our_shares: ctx.snapshots.our_position_shares(&signal.token_id).await,
        trader_prior_shares: ctx
            .snapshots
            .trader_position_shares(&trader, &signal.token_id)
            .await,
    };

    let plan = match ctx.sizer.size(&signal, price, &inputs) {
        Ok(plan) => plan,
        Err(reason) => {
            tracing::info!(tx_hash = %tx_hash, reason = %reason, "Signal not sized into an order");
            ctx.stats.signal_rejected();
            counter!("signals_rejected").increment(1);
            return;
        }
    };

    let outcome = match ctx
        .submitter
        .submit(&plan, client_order_id_now(&tx_hash))
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(tx_hash = %tx_hash, error = %e, "Order submission failed — signal consumed");
            ctx.stats.signal_rejected();
            // Balances may have changed under us; resync before the next signal.
            ctx.snapshots.refresh_after_trade(&trader).await;
            return;
        }
    };

    // The hash is fully processed only once an order actually went out.
    ctx.validator.mark_processed(&tx_hash);
    ctx.stats.signal_processed();
    ctx.stats.order_submitted();

    let mut record = OrderRecord::new(
        outcome.order_id,
        plan.token_id.clone(),
        plan.side,
        plan.notional,
        plan.shares,
        plan.price,
        ctx.lifecycle.order_timeout.as_secs() as i64,
    );

    if outcome.immediately_filled {
        record.record_fill(record.requested_shares);
        record.transition(OrderState::Filled);
        ctx.stats.order_filled();
        tracing::info!(order_id = %record.order_id, "Order filled on submission");
        ctx.snapshots.refresh_after_trade(&trader).await;
        return;
    }

    // Lifecycle tracking runs concurrently; the engine moves on to the next
    // signal immediately.
    let exchange = ctx.exchange.clone();
    let snapshots = ctx.snapshots.clone();
    let stats = ctx.stats.clone();
    let lifecycle = ctx.lifecycle.clone();
    tokio::spawn(async move {
        manage_order(exchange, snapshots, stats, record, trader, lifecycle).await;
    });
}

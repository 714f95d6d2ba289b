use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use copybot::config::AppConfig;
use copybot::execution::{
    run_copy_engine, EngineContext, ExecutionQueue, LifecycleConfig, OrderSizer, OrderSubmitter,
    PricingEngine, SignalValidator, SizerConfig,
};
use copybot::ingestion::{run_activity_poller, PollerConfig, RateLimiter};
use copybot::polymarket::{ClobAuth, ClobClient, DataClient, ExchangeApi, MarketDataApi};
use copybot::services::{PipelineStats, SnapshotStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        traders = config.target_traders.len(),
        wallet = %config.wallet_address,
        copy_ratio = %config.copy_ratio,
        "Starting copy trading pipeline"
    );

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    let auth = ClobAuth::new(
        config.clob_api_key.clone(),
        &config.clob_api_secret,
        config.clob_passphrase.clone(),
    )?;
    let exchange: Arc<dyn ExchangeApi> = Arc::new(ClobClient::new(http.clone(), auth));
    let data: Arc<dyn MarketDataApi> = Arc::new(DataClient::new(http));

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_per_sec,
        config.rate_limit_capacity,
    ));
    let stats = Arc::new(PipelineStats::new());

    let snapshots = Arc::new(SnapshotStore::new(
        data.clone(),
        limiter.clone(),
        &config.wallet_address,
    ));
    tracing::info!("Warming balance and position snapshots...");
    snapshots.warm_up(&config.target_traders).await;

    let (queue, rx) = ExecutionQueue::new();

    let ctx = EngineContext {
        validator: SignalValidator::new(config.signal_expiry_secs),
        pricing: PricingEngine::new(config.price_premium),
        sizer: OrderSizer::new(SizerConfig {
            copy_ratio: config.copy_ratio,
            max_trader_usage_cap: config.max_trader_usage_cap,
            min_trade_ratio: config.min_trade_ratio,
            max_order_size: config.max_order_size,
            min_order_size: config.min_order_size,
            wallet_mode: config.wallet_mode,
        }),
        submitter: OrderSubmitter::new(exchange.clone()),
        exchange,
        snapshots,
        stats: stats.clone(),
        lifecycle: LifecycleConfig {
            check_interval: config.status_check_interval,
            order_timeout: config.order_timeout,
        },
    };
    let engine = tokio::spawn(run_copy_engine(rx, ctx));

    let running = Arc::new(AtomicBool::new(true));
    let poller_config = PollerConfig {
        poll_interval: config.poll_interval,
        rate_limit_backoff: config.poll_backoff,
        error_backoff: config.poll_backoff,
        aggregation_window_secs: config.aggregation_window_secs,
    };

    // Spread poller start times across one poll interval so N traders don't
    // burst-fire the same instant.
    let phase = config.poll_interval / config.target_traders.len().max(1) as u32;
    for (i, trader) in config.target_traders.iter().enumerate() {
        tokio::spawn(run_activity_poller(
            trader.clone(),
            phase * i as u32,
            data.clone(),
            limiter.clone(),
            queue.clone(),
            stats.clone(),
            running.clone(),
            poller_config.clone(),
        ));
    }
    tracing::info!(pollers = config.target_traders.len(), "Pipeline running");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    running.store(false, Ordering::Relaxed);
    queue.stop();

    // Let the engine drain, but don't hang forever on a wedged order.
    if tokio::time::timeout(Duration::from_secs(30), engine)
        .await
        .is_err()
    {
        tracing::warn!("Engine did not drain within 30s — exiting anyway");
    }

    tracing::info!(stats = ?stats.snapshot(), "Shutdown complete");
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();
}

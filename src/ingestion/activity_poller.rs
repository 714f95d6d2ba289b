use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::time::sleep;

use crate::execution::queue::ExecutionQueue;
use crate::models::{MarketInfo, Side, TradeSignal};
use crate::polymarket::types::ApiActivity;
use crate::polymarket::{DataClientError, MarketDataApi};
use crate::services::stats::PipelineStats;

use super::rate_limiter::RateLimiter;
use super::watermark::TraderWatermark;

/// Poller timing and filtering knobs.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Pause between polls for one trader; the rate limiter does the real
    /// pacing, this just yields the scheduler.
    pub poll_interval: Duration,
    /// Backoff after an upstream 429.
    pub rate_limit_backoff: Duration,
    /// Backoff after a timeout or other transient error.
    pub error_backoff: Duration,
    /// Activities older than this are stale backfill and are ignored.
    pub aggregation_window_secs: i64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            rate_limit_backoff: Duration::from_secs(5),
            error_backoff: Duration::from_secs(5),
            aggregation_window_secs: 300,
        }
    }
}

/// Why an activity record could not be turned into a `TradeSignal`.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("activity missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unparseable timestamp: {0}")]
    BadTimestamp(String),

    #[error("unknown side: {0}")]
    UnknownSide(String),

    #[error("notional is zero or negative")]
    InvalidNotional,
}

/// Poll one trader's activity feed until shutdown.
///
/// Failures are isolated per trader: a 429 or timeout backs off and retries,
/// a 404 is an empty feed, and nothing terminates the loop short of the
/// running flag going down.
#[allow(clippy::too_many_arguments)]
pub async fn run_activity_poller(
    trader: String,
    initial_delay: Duration,
    data: Arc<dyn MarketDataApi>,
    limiter: Arc<RateLimiter>,
    queue: ExecutionQueue,
    stats: Arc<PipelineStats>,
    running: Arc<AtomicBool>,
    config: PollerConfig,
) {
    // Phase-spread start so N pollers don't fire a synchronized burst.
    if !initial_delay.is_zero() {
        sleep(initial_delay).await;
    }

    let mut watermark = TraderWatermark::new(config.aggregation_window_secs);
    tracing::info!(trader = %trader, "Activity poller started");

    while running.load(Ordering::Relaxed) {
        limiter.acquire().await;

        match data.get_activity(&trader).await {
            Ok(activities) => {
                let report = process_activities(
                    &trader,
                    &activities,
                    &mut watermark,
                    Utc::now().timestamp(),
                    config.aggregation_window_secs,
                    &queue,
                );

                stats.record_watermark(&trader, watermark.last_processed());

                if report.enqueued > 0 {
                    counter!("signals_detected").increment(report.enqueued);
                    tracing::info!(
                        trader = %trader,
                        new_signals = report.enqueued,
                        skipped = report.skipped,
                        "New trades detected"
                    );
                }
            }
            Err(DataClientError::NotFound) => {
                // Trader with no activity yet — a normal empty result.
                tracing::debug!(trader = %trader, "No activity recorded (404)");
            }
            Err(DataClientError::RateLimited) => {
                tracing::warn!(trader = %trader, "Upstream rate limit hit (429) — backing off");
                sleep(config.rate_limit_backoff).await;
            }
            Err(e) => {
                tracing::warn!(trader = %trader, error = %e, "Activity fetch failed — backing off");
                sleep(config.error_backoff).await;
            }
        }

        sleep(config.poll_interval).await;
    }

    tracing::info!(trader = %trader, "Activity poller stopped");
}

/// Outcome of one poll cycle.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub enqueued: u64,
    pub skipped: u64,
}

/// Apply the skip rules in feed order and enqueue whatever survives.
///
/// Skip order: non-trade events, records older than the aggregation window,
/// already-seen hashes, records at or behind the timestamp watermark.
pub fn process_activities(
    trader: &str,
    activities: &[ApiActivity],
    watermark: &mut TraderWatermark,
    now: i64,
    window_secs: i64,
    queue: &ExecutionQueue,
) -> BatchReport {
    let cutoff = now - window_secs;
    let mut report = BatchReport::default();

    for activity in activities {
        if activity.kind.as_deref() != Some("TRADE") {
            continue;
        }

        let activity_ts = match parse_activity_timestamp(activity.timestamp.as_ref()) {
            Ok(ts) => ts,
            Err(e) => {
                tracing::warn!(trader = %trader, error = %e, "Dropping unparseable activity");
                report.skipped += 1;
                continue;
            }
        };

        if activity_ts < cutoff {
            report.skipped += 1;
            continue;
        }

        let tx_hash = match activity.transaction_hash.as_deref() {
            Some(h) if !h.is_empty() => h,
            _ => {
                tracing::warn!(trader = %trader, "Dropping activity without transaction hash");
                report.skipped += 1;
                continue;
            }
        };

        if watermark.contains(tx_hash) {
            report.skipped += 1;
            continue;
        }

        if activity_ts <= watermark.last_processed() {
            report.skipped += 1;
            continue;
        }

        match normalize_activity(trader, activity) {
            Ok(signal) => {
                tracing::info!(
                    trader = %trader,
                    tx_hash = %signal.original_tx_hash,
                    side = %signal.side,
                    notional = %signal.amount_usd,
                    "Trade detected — enqueued for execution"
                );
                queue.submit(signal);
                watermark.record(tx_hash, activity_ts, now);
                report.enqueued += 1;
            }
            Err(e) => {
                tracing::warn!(trader = %trader, error = %e, "Dropping malformed activity");
                report.skipped += 1;
            }
        }
    }

    report
}

/// Normalize one feed record into the canonical `TradeSignal` shape.
/// Every historical field-shape variant funnels through here; anything
/// that cannot be parsed is a typed error, never a silent zero.
pub fn normalize_activity(
    trader: &str,
    activity: &ApiActivity,
) -> Result<TradeSignal, NormalizeError> {
    let token_id = activity
        .asset
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(NormalizeError::MissingField("asset"))?;

    let tx_hash = activity
        .transaction_hash
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(NormalizeError::MissingField("transactionHash"))?;

    let side_str = activity
        .side
        .as_deref()
        .ok_or(NormalizeError::MissingField("side"))?;
    let side = Side::from_api_str(side_str)
        .ok_or_else(|| NormalizeError::UnknownSide(side_str.to_string()))?;

    // Prefer the explicit USD field; otherwise derive size × price.
    let amount_usd = match activity.usdc_size {
        Some(v) if v > Decimal::ZERO => v,
        _ => {
            let size = activity.size.unwrap_or(Decimal::ZERO);
            let price = activity.price.unwrap_or(Decimal::ZERO);
            size * price
        }
    };
    if amount_usd <= Decimal::ZERO {
        return Err(NormalizeError::InvalidNotional);
    }

    let price = activity.price.filter(|p| *p > Decimal::ZERO);
    let shares = price.map(|p| amount_usd / p);

    Ok(TradeSignal {
        source_trader: trader.to_string(),
        original_tx_hash: tx_hash.to_string(),
        token_id: token_id.to_string(),
        side,
        amount_usd,
        price,
        shares,
        market_info: MarketInfo {
            slug: activity
                .slug
                .clone()
                .or_else(|| activity.title.clone())
                .unwrap_or_default(),
            question: activity.title.clone().unwrap_or_default(),
            outcome: activity.outcome.clone().unwrap_or_default(),
        },
        detected_at: Utc::now(),
    })
}

/// Activity timestamps have shipped as epoch seconds, epoch millis, and
/// RFC3339 strings.
fn parse_activity_timestamp(value: Option<&serde_json::Value>) -> Result<i64, NormalizeError> {
    let value = value.ok_or(NormalizeError::MissingField("timestamp"))?;

    match value {
        serde_json::Value::Number(n) => {
            let raw = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| NormalizeError::BadTimestamp(n.to_string()))?;
            Ok(normalize_epoch(raw))
        }
        serde_json::Value::String(s) => {
            if let Ok(raw) = s.parse::<i64>() {
                return Ok(normalize_epoch(raw));
            }
            chrono::DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.timestamp())
                .map_err(|_| NormalizeError::BadTimestamp(s.clone()))
        }
        other => Err(NormalizeError::BadTimestamp(other.to_string())),
    }
}

/// Values above ~1e12 are epoch milliseconds.
fn normalize_epoch(raw: i64) -> i64 {
    if raw > 1_000_000_000_000 {
        raw / 1000
    } else {
        raw
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

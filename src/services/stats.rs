use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;

/// Process-wide pipeline counters, shared across pollers, the engine, and
/// lifecycle tasks. Atomics for the hot counters, a mutex only for the
/// per-trader watermark map.
#[derive(Default)]
pub struct PipelineStats {
    signals_processed: AtomicU64,
    signals_rejected: AtomicU64,
    orders_submitted: AtomicU64,
    orders_filled: AtomicU64,
    orders_cancelled: AtomicU64,
    orders_pending: AtomicI64,
    watermarks: Mutex<HashMap<String, i64>>,
}

/// Point-in-time copy of the counters, serializable for the shutdown log.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub signals_processed: u64,
    pub signals_rejected: u64,
    pub orders_submitted: u64,
    pub orders_filled: u64,
    pub orders_cancelled: u64,
    pub orders_pending: i64,
    pub watermarks: HashMap<String, i64>,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal_processed(&self) {
        self.signals_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn signal_rejected(&self) {
        self.signals_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn order_submitted(&self) {
        self.orders_submitted.fetch_add(1, Ordering::Relaxed);
        self.orders_pending.fetch_add(1, Ordering::Relaxed);
    }

    pub fn order_filled(&self) {
        self.orders_filled.fetch_add(1, Ordering::Relaxed);
        self.orders_pending.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn order_cancelled(&self) {
        self.orders_cancelled.fetch_add(1, Ordering::Relaxed);
        self.orders_pending.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_watermark(&self, trader: &str, ts: i64) {
        if let Ok(mut map) = self.watermarks.lock() {
            map.insert(trader.to_string(), ts);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            signals_processed: self.signals_processed.load(Ordering::Relaxed),
            signals_rejected: self.signals_rejected.load(Ordering::Relaxed),
            orders_submitted: self.orders_submitted.load(Ordering::Relaxed),
            orders_filled: self.orders_filled.load(Ordering::Relaxed),
            orders_cancelled: self.orders_cancelled.load(Ordering::Relaxed),
            orders_pending: self.orders_pending.load(Ordering::Relaxed),
            watermarks: self
                .watermarks
                .lock()
                .map(|m| m.clone())
                .unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

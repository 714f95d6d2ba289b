use std::collections::{HashSet, VecDeque};

/// Per-trader dedup state: a monotonic timestamp watermark plus a bounded
/// set of recently seen transaction hashes.
///
/// Only duplicates inside the aggregation window matter (anything older is
/// dropped by the staleness check before dedup runs), so seen hashes are
/// evicted once their timestamp falls out of the window instead of growing
/// for the process lifetime.
pub struct TraderWatermark {
    last_processed_ts: i64,
    window_secs: i64,
    seen: HashSet<String>,
    order: VecDeque<(i64, String)>,
}

impl TraderWatermark {
    pub fn new(window_secs: i64) -> Self {
        Self {
            last_processed_ts: 0,
            window_secs,
            seen: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    pub fn last_processed(&self) -> i64 {
        self.last_processed_ts
    }

    pub fn contains(&self, tx_hash: &str) -> bool {
        self.seen.contains(tx_hash)
    }

    /// Record a processed transaction and advance the watermark to
    /// `max(current, activity_ts)`. Evicts hashes older than the window.
    pub fn record(&mut self, tx_hash: &str, activity_ts: i64, now: i64) {
        self.evict(now);
        if self.seen.insert(tx_hash.to_string()) {
            self.order.push_back((activity_ts, tx_hash.to_string()));
        }
        self.last_processed_ts = self.last_processed_ts.max(activity_ts);
    }

    fn evict(&mut self, now: i64) {
        let horizon = now - self.window_secs;
        while let Some((ts, _)) = self.order.front() {
            if *ts >= horizon {
                break;
            }
            let (_, hash) = self.order.pop_front().expect("front checked above");
            self.seen.remove(&hash);
        }
    }

    /// Number of hashes currently tracked.
    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_never_reprocessed() {
        let mut wm = TraderWatermark::new(300);
        let now = 1_700_000_000;

        assert!(!wm.contains("0xabc"));
        wm.record("0xabc", now, now);
        assert!(wm.contains("0xabc"));

        // Recording again is a no-op for the set.
        wm.record("0xabc", now, now);
        assert_eq!(wm.seen_len(), 1);
    }

    #[test]
    fn test_watermark_is_monotonic() {
        let mut wm = TraderWatermark::new(300);
        let now = 1_700_000_000;

        wm.record("0xaaa", now, now);
        assert_eq!(wm.last_processed(), now);

        // An older activity never moves the watermark backwards.
        wm.record("0xbbb", now - 50, now);
        assert_eq!(wm.last_processed(), now);

        wm.record("0xccc", now + 10, now);
        assert_eq!(wm.last_processed(), now + 10);
    }

    #[test]
    fn test_old_hashes_evicted_outside_window() {
        let mut wm = TraderWatermark::new(300);
        let t0 = 1_700_000_000;

        wm.record("0xold", t0, t0);
        assert!(wm.contains("0xold"));

        // 301 seconds later the hash falls out of the horizon.
        let t1 = t0 + 301;
        wm.record("0xnew", t1, t1);
        assert!(!wm.contains("0xold"));
        assert!(wm.contains("0xnew"));
        assert_eq!(wm.seen_len(), 1);
    }
}

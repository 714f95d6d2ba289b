use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::TradeSignal;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("duplicate signal (tx already executed)")]
    Duplicate,

    #[error("signal expired ({age_secs}s old, limit {limit_secs}s)")]
    Expired { age_secs: i64, limit_secs: i64 },

    #[error("invalid signal: {0}")]
    Invalid(&'static str),
}

/// Engine-side gate applied to every dequeued signal.
///
/// The processed set is distinct from the poller watermark: a hash lands
/// here only once an order was actually submitted for it, so a signal that
/// failed mid-execution can be retried if the feed re-delivers it.
pub struct SignalValidator {
    processed: HashSet<String>,
    expiry_secs: i64,
}

impl SignalValidator {
    pub fn new(expiry_secs: i64) -> Self {
        Self {
            processed: HashSet::new(),
            expiry_secs,
        }
    }

    pub fn validate(&self, signal: &TradeSignal, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.processed.contains(&signal.original_tx_hash) {
            return Err(ValidationError::Duplicate);
        }

        let age = signal.age_secs(now);
        if age > self.expiry_secs {
            return Err(ValidationError::Expired {
                age_secs: age,
                limit_secs: self.expiry_secs,
            });
        }

        if signal.token_id.is_empty() {
            return Err(ValidationError::Invalid("empty token id"));
        }
        if signal.amount_usd <= Decimal::ZERO {
            return Err(ValidationError::Invalid("non-positive notional"));
        }

        Ok(())
    }

    /// Mark a hash fully processed. Called only after successful submission.
    pub fn mark_processed(&mut self, tx_hash: &str) {
        self.processed.insert(tx_hash.to_string());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

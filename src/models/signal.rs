use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::Side;

/// Display-only market context carried alongside a signal.
#[derive(Debug, Clone, Default)]
pub struct MarketInfo {
    pub slug: String,
    pub question: String,
    pub outcome: String,
}

/// One detected trade by a watched trader, normalized and ready for the
/// execution pipeline. Immutable once constructed; consumed exactly once.
#[derive(Debug, Clone)]
pub struct TradeSignal {
    /// The watched trader whose fill we are copying.
    pub source_trader: String,
    /// Transaction hash of the trader's fill — the dedup key.
    pub original_tx_hash: String,
    /// Token (asset) ID for the specific outcome.
    pub token_id: String,
    pub side: Side,
    /// Trader's notional in USDC.
    pub amount_usd: Decimal,
    /// Trader's fill price per share, when the feed provides it.
    pub price: Option<Decimal>,
    /// Shares derived from `amount_usd / price`, when derivable.
    pub shares: Option<Decimal>,
    pub market_info: MarketInfo,
    /// When the poller detected the trade (drives signal expiry).
    pub detected_at: DateTime<Utc>,
}

impl TradeSignal {
    /// Age of the signal in whole seconds relative to `now`.
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.detected_at).num_seconds()
    }

    /// Trader price per share: the reported fill price, falling back to
    /// `amount / shares` when only the derived share count is present.
    pub fn trader_price(&self) -> Option<Decimal> {
        if let Some(p) = self.price {
            if p > Decimal::ZERO {
                return Some(p);
            }
        }
        match self.shares {
            Some(s) if s > Decimal::ZERO => Some(self.amount_usd / s),
            _ => None,
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::ingestion::RateLimiter;
use crate::polymarket::MarketDataApi;

/// Cached view of one token position.
#[derive(Debug, Clone, Default)]
pub struct PositionSnapshot {
    pub shares: Decimal,
    pub avg_price: Decimal,
    pub cur_price: Decimal,
}

#[derive(Default)]
struct Inner {
    /// USDC balances keyed by lowercased address (ours and each trader's).
    balances: HashMap<String, Decimal>,
    /// Our positions keyed by token id.
    our_positions: HashMap<String, PositionSnapshot>,
    /// Trader positions: lowercased address → token id → snapshot.
    trader_positions: HashMap<String, HashMap<String, PositionSnapshot>>,
}

/// Balance and position snapshots backing the sizer's inputs.
///
/// Reads are always served from cache; refreshes happen only at startup and
/// explicitly after each completed trade, never on a background timer, so
/// the sizer sees a consistent (if slightly stale) view and the Market Data
/// API is not hammered mid-burst.
pub struct SnapshotStore {
    data: Arc<dyn MarketDataApi>,
    limiter: Arc<RateLimiter>,
    our_address: String,
    inner: RwLock<Inner>,
}

impl SnapshotStore {
    pub fn new(data: Arc<dyn MarketDataApi>, limiter: Arc<RateLimiter>, our_address: &str) -> Self {
        Self {
            data,
            limiter,
            our_address: our_address.to_lowercase(),
            inner: RwLock::new(Inner::default()),
        }
    }

    // --- Cached reads -----------------------------------------------------

    pub async fn our_balance(&self) -> Decimal {
        let inner = self.inner.read().await;
        inner
            .balances
            .get(&self.our_address)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub async fn trader_balance(&self, trader: &str) -> Option<Decimal> {
        let inner = self.inner.read().await;
        inner.balances.get(&trader.to_lowercase()).copied()
    }

    pub async fn our_position_shares(&self, token_id: &str) -> Decimal {
        let inner = self.inner.read().await;
        inner
            .our_positions
            .get(token_id)
            .map(|p| p.shares)
            .unwrap_or(Decimal::ZERO)
    }

    pub async fn trader_position_shares(&self, trader: &str, token_id: &str) -> Option<Decimal> {
        let inner = self.inner.read().await;
        inner
            .trader_positions
            .get(&trader.to_lowercase())
            .and_then(|m| m.get(token_id))
            .map(|p| p.shares)
    }

    /// Last known mark for a token we hold; the sell-price fallback.
    pub async fn cached_price(&self, token_id: &str) -> Option<Decimal> {
        let inner = self.inner.read().await;
        inner
            .our_positions
            .get(token_id)
            .map(|p| p.cur_price)
            .filter(|p| *p > Decimal::ZERO)
    }

    // --- Refresh ----------------------------------------------------------

    /// Warm the cache for our wallet and every watched trader at startup.
    pub async fn warm_up(&self, traders: &[String]) {
        self.refresh_our_state().await;
        for trader in traders {
            self.refresh_trader_state(trader).await;
        }
    }

    /// Unconditional refresh after a trade settles, fails, or times out:
    /// trader positions, our positions, trader balance, our balance.
    /// Individual failures are logged and leave the previous cache entry in
    /// place.
    pub async fn refresh_after_trade(&self, trader: &str) {
        self.refresh_trader_state(trader).await;
        self.refresh_our_state().await;
    }

    async fn refresh_our_state(&self) {
        self.refresh_positions(&self.our_address, true).await;
        self.refresh_balance(&self.our_address).await;
    }

    async fn refresh_trader_state(&self, trader: &str) {
        let trader = trader.to_lowercase();
        self.refresh_positions(&trader, false).await;
        self.refresh_balance(&trader).await;
    }

    async fn refresh_positions(&self, address: &str, is_ours: bool) {
        self.limiter.acquire().await;
        match self.data.get_positions(address).await {
            Ok(positions) => {
                let map: HashMap<String, PositionSnapshot> = positions
                    .into_iter()
                    .filter_map(|p| {
                        let token_id = p.asset?;
                        Some((
                            token_id,
                            PositionSnapshot {
                                shares: p.size.unwrap_or(Decimal::ZERO),
                                avg_price: p.avg_price.unwrap_or(Decimal::ZERO),
                                cur_price: p.cur_price.unwrap_or(Decimal::ZERO),
                            },
                        ))
                    })
                    .collect();

                let mut inner = self.inner.write().await;
                if is_ours {
                    inner.our_positions = map;
                } else {
                    inner.trader_positions.insert(address.to_string(), map);
                }
            }
            Err(e) => {
                tracing::warn!(address, error = %e, "Position refresh failed — keeping cached view");
            }
        }
    }

    async fn refresh_balance(&self, address: &str) {
        self.limiter.acquire().await;
        match self.data.get_usdc_balance(address).await {
            Ok(balance) => {
                let mut inner = self.inner.write().await;
                inner.balances.insert(address.to_string(), balance);
            }
            Err(e) => {
                tracing::warn!(address, error = %e, "Balance refresh failed — keeping cached view");
            }
        }
    }
}

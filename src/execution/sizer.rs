use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::WalletMode;
use crate::models::{Side, TradeSignal};
use crate::polymarket::types::OrderType;

/// Exchange minimum lot size in shares.
pub const MIN_ORDER_SHARES: Decimal = Decimal::from_parts(5, 0, 0, false, 0);
/// Exchange minimum order notional in USDC.
pub const MIN_ORDER_NOTIONAL: Decimal = Decimal::from_parts(1, 0, 0, false, 0);

/// Trader notional above which a tiny usage ratio is treated as a whale's
/// deliberate bet rather than noise.
const LARGE_ORDER_THRESHOLD: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
const FORCED_MIN_USAGE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// Why a signal was not turned into an order. All of these mean "skip",
/// never "retry".
#[derive(Debug, Error, PartialEq)]
pub enum SizingRejection {
    #[error("no position held in this token, nothing to sell")]
    NoPosition,

    #[error("trader balance unknown or zero, cannot derive usage ratio")]
    TraderBalanceUnknown,

    #[error("trade too small relative to trader balance (usage {usage})")]
    NegligibleUsage { usage: Decimal },

    #[error("computed amount {amount} below minimum notional")]
    BelowMinNotional { amount: Decimal },

    #[error("computed amount {amount} below configured minimum order size {min}")]
    BelowMinOrderSize { amount: Decimal, min: Decimal },

    #[error("computed amount {amount} exceeds spendable balance {spendable}")]
    ExceedsBalance { amount: Decimal, spendable: Decimal },

    #[error("no valid price for this signal")]
    NoPrice,
}

/// Concrete order the submitter will place.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    pub token_id: String,
    pub side: Side,
    pub price: Decimal,
    pub shares: Decimal,
    pub notional: Decimal,
    pub order_type: OrderType,
}

/// Balance and position snapshot values the sizer works from. Gathered by
/// the caller so the math here stays pure and directly testable.
#[derive(Debug, Clone, Default)]
pub struct SizingInputs {
    pub our_balance: Decimal,
    pub trader_balance: Option<Decimal>,
    pub our_shares: Decimal,
    pub trader_prior_shares: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct SizerConfig {
    pub copy_ratio: Decimal,
    pub max_trader_usage_cap: Decimal,
    pub min_trade_ratio: Decimal,
    pub max_order_size: Decimal,
    pub min_order_size: Option<Decimal>,
    pub wallet_mode: WalletMode,
}

pub struct OrderSizer {
    config: SizerConfig,
}

impl OrderSizer {
    pub fn new(config: SizerConfig) -> Self {
        Self { config }
    }

    pub fn size(
        &self,
        signal: &TradeSignal,
        price: Decimal,
        inputs: &SizingInputs,
    ) -> Result<OrderPlan, SizingRejection> {
        if price <= Decimal::ZERO {
            return Err(SizingRejection::NoPrice);
        }

        match signal.side {
            Side::Sell => self.size_sell(signal, price, inputs),
            Side::Buy => self.size_buy(signal, price, inputs),
        }
    }

    fn size_sell(
        &self,
        signal: &TradeSignal,
        price: Decimal,
        inputs: &SizingInputs,
    ) -> Result<OrderPlan, SizingRejection> {
        if inputs.our_shares <= Decimal::ZERO {
            return Err(SizingRejection::NoPosition);
        }

        // Dust: below the minimum lot size a ratio sell can strand an
        // unsellable remainder, so liquidate everything immediately.
        if inputs.our_shares < MIN_ORDER_SHARES {
            return Ok(OrderPlan {
                token_id: signal.token_id.clone(),
                side: Side::Sell,
                price,
                shares: inputs.our_shares,
                notional: inputs.our_shares * price,
                order_type: OrderType::Fok,
            });
        }

        // Mirror the fraction of the position the trader exited; unknown
        // prior balance reads as a full exit.
        let sell_ratio = match (signal.shares, inputs.trader_prior_shares) {
            (Some(sold), Some(prior)) if prior > Decimal::ZERO => {
                (sold / prior).clamp(Decimal::ZERO, Decimal::ONE)
            }
            _ => Decimal::ONE,
        };

        let shares = (inputs.our_shares * sell_ratio)
            .max(MIN_ORDER_SHARES)
            .min(inputs.our_shares);

        Ok(OrderPlan {
            token_id: signal.token_id.clone(),
            side: Side::Sell,
            price,
            shares,
            notional: shares * price,
            order_type: OrderType::Gtc,
        })
    }

    fn size_buy(
        &self,
        signal: &TradeSignal,
        price: Decimal,
        inputs: &SizingInputs,
    ) -> Result<OrderPlan, SizingRejection> {
        let trader_balance = inputs
            .trader_balance
            .filter(|b| *b > Decimal::ZERO)
            .ok_or(SizingRejection::TraderBalanceUnknown)?;

        let mut usage = signal.amount_usd / trader_balance;

        // A whale's large absolute bet at a tiny fraction of their bankroll
        // is still a real position for us.
        if signal.amount_usd > LARGE_ORDER_THRESHOLD && usage < FORCED_MIN_USAGE {
            usage = FORCED_MIN_USAGE;
        }

        if usage < self.config.min_trade_ratio {
            return Err(SizingRejection::NegligibleUsage { usage });
        }

        usage = usage.min(self.config.max_trader_usage_cap);

        let target = (inputs.our_balance * usage * self.config.copy_ratio)
            .min(signal.amount_usd);

        let shares = (target / price).max(MIN_ORDER_SHARES);
        let mut amount = shares * price;

        if amount < MIN_ORDER_NOTIONAL {
            return Err(SizingRejection::BelowMinNotional { amount });
        }

        let (shares, amount) = if amount > self.config.max_order_size {
            amount = self.config.max_order_size;
            (amount / price, amount)
        } else {
            (shares, amount)
        };

        // The cap can shrink the order back under the lot minimum; refuse
        // rather than emit a plan the exchange would reject.
        if shares < MIN_ORDER_SHARES {
            return Err(SizingRejection::BelowMinNotional { amount });
        }

        if let Some(min) = self.config.min_order_size {
            if amount < min {
                return Err(SizingRejection::BelowMinOrderSize { amount, min });
            }
        }

        let spendable = match self.config.wallet_mode {
            WalletMode::Relay => inputs.our_balance,
            WalletMode::Direct => inputs.our_balance * Decimal::new(9, 1),
        };
        if amount > spendable {
            return Err(SizingRejection::ExceedsBalance { amount, spendable });
        }

        Ok(OrderPlan {
            token_id: signal.token_id.clone(),
            side: Side::Buy,
            price,
            shares,
            notional: amount,
            order_type: OrderType::Gtc,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MarketInfo;
    use chrono::Utc;

    fn buy_signal(amount_usd: Decimal) -> TradeSignal {
        TradeSignal {
            source_trader: "0xtrader".into(),
            original_tx_hash: "0xabc".into(),
            token_id: "token-1".into(),
            side: Side::Buy,
            amount_usd,
            price: Some(Decimal::new(50, 2)),
            shares: None,
            market_info: MarketInfo::default(),
            detected_at: Utc::now(),
        }
    }

    fn sell_signal(sold_shares: Decimal) -> TradeSignal {
        TradeSignal {
            source_trader: "0xtrader".into(),
            original_tx_hash: "0xdef".into(),
            token_id: "token-1".into(),
            side: Side::Sell,
            amount_usd: sold_shares * Decimal::new(50, 2),
            price: Some(Decimal::new(50, 2)),
            shares: Some(sold_shares),
            market_info: MarketInfo::default(),
            detected_at: Utc::now(),
        }
    }

    fn sizer(copy_ratio: Decimal) -> OrderSizer {
        OrderSizer::new(SizerConfig {
            copy_ratio,
            max_trader_usage_cap: Decimal::new(1, 1),
            min_trade_ratio: Decimal::new(1, 3),
            max_order_size: Decimal::from(10_000),
            min_order_size: None,
            wallet_mode: WalletMode::Relay,
        })
    }

    #[test]
    fn test_buy_mirrors_usage_ratio() {
        // Trader with $1000 buys $100 (10% usage, at the cap); our $500
        // balance at copy ratio 1.0 targets $50.
        let signal = buy_signal(Decimal::from(100));
        let inputs = SizingInputs {
            our_balance: Decimal::from(500),
            trader_balance: Some(Decimal::from(1000)),
            ..Default::default()
        };

        let plan = sizer(Decimal::ONE)
            .size(&signal, Decimal::new(50, 2), &inputs)
            .unwrap();
        assert_eq!(plan.notional, Decimal::from(50));
        assert_eq!(plan.shares, Decimal::from(100));
        assert_eq!(plan.order_type, OrderType::Gtc);
    }

    #[test]
    fn test_buy_capped_at_trader_notional() {
        // Huge balance on our side must never out-spend the trader.
        let signal = buy_signal(Decimal::from(20));
        let inputs = SizingInputs {
            our_balance: Decimal::from(100_000),
            trader_balance: Some(Decimal::from(200)),
            ..Default::default()
        };

        let plan = sizer(Decimal::ONE)
            .size(&signal, Decimal::new(50, 2), &inputs)
            .unwrap();
        assert_eq!(plan.notional, Decimal::from(20));
    }

    #[test]
    fn test_buy_unknown_trader_balance_skips() {
        let signal = buy_signal(Decimal::from(100));
        let inputs = SizingInputs {
            our_balance: Decimal::from(500),
            trader_balance: None,
            ..Default::default()
        };

        assert_eq!(
            sizer(Decimal::ONE).size(&signal, Decimal::new(50, 2), &inputs),
            Err(SizingRejection::TraderBalanceUnknown)
        );
    }

    #[test]
    fn test_buy_whale_usage_forced_to_one_percent() {
        // $2000 bet at 0.2% of a $1M bankroll is bumped to 1%.
        let signal = buy_signal(Decimal::from(2000));
        let inputs = SizingInputs {
            our_balance: Decimal::from(1000),
            trader_balance: Some(Decimal::from(1_000_000)),
            ..Default::default()
        };

        let plan = sizer(Decimal::ONE)
            .size(&signal, Decimal::new(50, 2), &inputs)
            .unwrap();
        assert_eq!(plan.notional, Decimal::from(10)); // 1000 * 1% * 1.0
    }

    #[test]
    fn test_buy_small_trade_keeps_raw_ratio() {
        // $5 at 0.5% of $1000 does not hit the whale threshold; the target
        // is lifted to the 5-share lot minimum instead.
        let signal = buy_signal(Decimal::from(5));
        let inputs = SizingInputs {
            our_balance: Decimal::from(100),
            trader_balance: Some(Decimal::from(1000)),
            ..Default::default()
        };

        let plan = sizer(Decimal::ONE)
            .size(&signal, Decimal::new(50, 2), &inputs)
            .unwrap();
        assert_eq!(plan.shares, Decimal::from(5));
        assert_eq!(plan.notional, Decimal::new(250, 2));
    }

    #[test]
    fn test_buy_sub_dollar_amount_refused() {
        // 5 shares at $0.10 is $0.50: below the $1 floor, refused outright.
        let signal = buy_signal(Decimal::from(5));
        let inputs = SizingInputs {
            our_balance: Decimal::from(100),
            trader_balance: Some(Decimal::from(1000)),
            ..Default::default()
        };

        assert!(matches!(
            sizer(Decimal::ONE).size(&signal, Decimal::new(10, 2), &inputs),
            Err(SizingRejection::BelowMinNotional { .. })
        ));
    }

    #[test]
    fn test_buy_cap_below_lot_minimum_refused() {
        // A max order size under 5 × price would cap the plan to fewer than
        // 5 shares; the sizer refuses instead of emitting it.
        let signal = buy_signal(Decimal::from(100));
        let sizer = OrderSizer::new(SizerConfig {
            copy_ratio: Decimal::ONE,
            max_trader_usage_cap: Decimal::new(1, 1),
            min_trade_ratio: Decimal::new(1, 3),
            max_order_size: Decimal::ONE,
            min_order_size: None,
            wallet_mode: WalletMode::Relay,
        });
        let inputs = SizingInputs {
            our_balance: Decimal::from(500),
            trader_balance: Some(Decimal::from(1000)),
            ..Default::default()
        };

        assert!(matches!(
            sizer.size(&signal, Decimal::new(50, 2), &inputs),
            Err(SizingRejection::BelowMinNotional { .. })
        ));
    }

    #[test]
    fn test_buy_negligible_usage_refused() {
        // $0.50 at 0.05% of the trader's balance is below min_trade_ratio.
        let signal = buy_signal(Decimal::new(50, 2));
        let inputs = SizingInputs {
            our_balance: Decimal::from(1000),
            trader_balance: Some(Decimal::from(1000)),
            ..Default::default()
        };

        assert!(matches!(
            sizer(Decimal::ONE).size(&signal, Decimal::new(50, 2), &inputs),
            Err(SizingRejection::NegligibleUsage { .. })
        ));
    }

    #[test]
    fn test_buy_direct_wallet_reserves_gas_headroom() {
        let signal = buy_signal(Decimal::from(100));
        let sizer = OrderSizer::new(SizerConfig {
            copy_ratio: Decimal::ONE,
            max_trader_usage_cap: Decimal::ONE,
            min_trade_ratio: Decimal::new(1, 3),
            max_order_size: Decimal::from(10_000),
            min_order_size: None,
            wallet_mode: WalletMode::Direct,
        });
        // Full usage would spend the whole balance; direct wallets keep 10%.
        let inputs = SizingInputs {
            our_balance: Decimal::from(100),
            trader_balance: Some(Decimal::from(100)),
            ..Default::default()
        };

        assert!(matches!(
            sizer.size(&signal, Decimal::new(50, 2), &inputs),
            Err(SizingRejection::ExceedsBalance { .. })
        ));
    }

    #[test]
    fn test_sell_without_position_skips() {
        let signal = sell_signal(Decimal::from(100));
        let inputs = SizingInputs::default();

        assert_eq!(
            sizer(Decimal::ONE).size(&signal, Decimal::new(48, 2), &inputs),
            Err(SizingRejection::NoPosition)
        );
    }

    #[test]
    fn test_sell_dust_liquidates_fully_as_fok() {
        let signal = sell_signal(Decimal::from(100));
        let inputs = SizingInputs {
            our_shares: Decimal::from(3),
            ..Default::default()
        };

        let plan = sizer(Decimal::ONE)
            .size(&signal, Decimal::new(48, 2), &inputs)
            .unwrap();
        assert_eq!(plan.shares, Decimal::from(3));
        assert_eq!(plan.order_type, OrderType::Fok);
    }

    #[test]
    fn test_sell_mirrors_trader_exit_fraction() {
        // Trader sold 50 of 200 shares (25%); we hold 100 → sell 25.
        let signal = sell_signal(Decimal::from(50));
        let inputs = SizingInputs {
            our_shares: Decimal::from(100),
            trader_prior_shares: Some(Decimal::from(200)),
            ..Default::default()
        };

        let plan = sizer(Decimal::ONE)
            .size(&signal, Decimal::new(48, 2), &inputs)
            .unwrap();
        assert_eq!(plan.shares, Decimal::from(25));
        assert_eq!(plan.order_type, OrderType::Gtc);
    }

    #[test]
    fn test_sell_unknown_prior_is_full_exit_capped_at_holdings() {
        let signal = sell_signal(Decimal::from(50));
        let inputs = SizingInputs {
            our_shares: Decimal::from(40),
            trader_prior_shares: None,
            ..Default::default()
        };

        let plan = sizer(Decimal::ONE)
            .size(&signal, Decimal::new(48, 2), &inputs)
            .unwrap();
        assert_eq!(plan.shares, Decimal::from(40));
    }

    #[test]
    fn test_usage_never_exceeds_cap() {
        // Trader goes all-in; we still mirror at most the 10% cap.
        let signal = buy_signal(Decimal::from(1000));
        let inputs = SizingInputs {
            our_balance: Decimal::from(1000),
            trader_balance: Some(Decimal::from(1000)),
            ..Default::default()
        };

        let plan = sizer(Decimal::ONE)
            .size(&signal, Decimal::new(50, 2), &inputs)
            .unwrap();
        assert_eq!(plan.notional, Decimal::from(100)); // 1000 * 10% cap
    }
}

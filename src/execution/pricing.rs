use rust_decimal::Decimal;

use crate::models::{Side, TradeSignal};

/// Limit-price policy: pay a small premium over the copied trader's fill to
/// raise our own fill odds, clamped to the exchange's valid tick range.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    premium: Decimal,
}

impl PricingEngine {
    pub fn new(premium: Decimal) -> Self {
        Self { premium }
    }

    /// Price an order off the signal itself. Returns `None` when no safe
    /// price exists, which skips the trade.
    pub fn price_from_signal(&self, signal: &TradeSignal) -> Option<Decimal> {
        let trader_price = signal.trader_price()?;
        self.price_from_reference(signal.side, trader_price)
    }

    /// Price an order off a reference price (the trader's fill, or for a
    /// SELL with no usable signal price, our cached mark for the token).
    pub fn price_from_reference(&self, side: Side, reference: Decimal) -> Option<Decimal> {
        if reference <= Decimal::ZERO {
            return None;
        }

        match side {
            Side::Buy => {
                // Above 0.99 there is no room to bid over; skip rather than
                // buy a near-resolved outcome at the cap.
                if reference > Decimal::new(99, 2) {
                    return None;
                }
                Some(clamp(
                    reference + self.premium,
                    Decimal::new(1, 3),
                    Decimal::new(99, 2),
                ))
            }
            Side::Sell => Some(clamp(
                reference - self.premium,
                Decimal::new(1, 2),
                Decimal::new(99, 2),
            )),
        }
    }
}

fn clamp(value: Decimal, min: Decimal, max: Decimal) -> Decimal {
    value.max(min).min(max)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

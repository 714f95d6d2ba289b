use std::env;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// How the trading wallet pays for execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletMode {
    /// Funded relay wallet: the full USDC balance is spendable.
    Relay,
    /// Wallet holds its own gas funds: keep 10% headroom unspent.
    Direct,
}

impl FromStr for WalletMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relay" => Ok(WalletMode::Relay),
            "direct" => Ok(WalletMode::Direct),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Trader wallet addresses to copy, lowercased.
    pub target_traders: Vec<String>,
    pub wallet_address: String,
    pub wallet_mode: WalletMode,

    // CLOB credentials. All three are required: without them no order can be
    // signed, so startup halts rather than running a bot that cannot trade.
    pub clob_api_key: String,
    pub clob_api_secret: String,
    pub clob_passphrase: String,

    pub copy_ratio: Decimal,
    pub price_premium: Decimal,
    pub max_trader_usage_cap: Decimal,
    pub min_trade_ratio: Decimal,
    pub max_order_size: Decimal,
    pub min_order_size: Option<Decimal>,

    pub signal_expiry_secs: i64,
    pub order_timeout: Duration,
    pub status_check_interval: Duration,
    pub aggregation_window_secs: i64,

    pub rate_limit_per_sec: f64,
    pub rate_limit_capacity: f64,
    pub poll_interval: Duration,
    pub poll_backoff: Duration,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let target_traders: Vec<String> = required("TARGET_TRADERS")?
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        if target_traders.is_empty() {
            return Err(ConfigError::Invalid {
                key: "TARGET_TRADERS",
                value: "empty list".into(),
            });
        }

        Ok(Self {
            target_traders,
            wallet_address: required("WALLET_ADDRESS")?.to_lowercase(),
            wallet_mode: parse_or("WALLET_MODE", WalletMode::Relay)?,

            clob_api_key: required("CLOB_API_KEY")?,
            clob_api_secret: required("CLOB_API_SECRET")?,
            clob_passphrase: required("CLOB_PASSPHRASE")?,

            copy_ratio: decimal_or("COPY_RATIO", Decimal::new(1, 1))?,
            price_premium: decimal_or("PRICE_PREMIUM", Decimal::new(2, 2))?,
            max_trader_usage_cap: decimal_or("MAX_TRADER_USAGE_CAP", Decimal::new(1, 1))?,
            min_trade_ratio: decimal_or("MIN_TRADE_RATIO", Decimal::new(1, 3))?,
            max_order_size: decimal_or("MAX_ORDER_SIZE", Decimal::from(10_000))?,
            min_order_size: decimal_opt("MIN_ORDER_SIZE")?,

            signal_expiry_secs: parse_or("SIGNAL_EXPIRY_SECS", 60)?,
            order_timeout: Duration::from_secs(parse_or("ORDER_TIMEOUT_SECS", 300u64)?),
            status_check_interval: Duration::from_secs(parse_or(
                "STATUS_CHECK_INTERVAL_SECS",
                10u64,
            )?),
            aggregation_window_secs: parse_or("AGGREGATION_WINDOW_SECS", 300)?,

            rate_limit_per_sec: parse_or("RATE_LIMIT_PER_SEC", 18.0)?,
            rate_limit_capacity: parse_or("RATE_LIMIT_CAPACITY", 180.0)?,
            poll_interval: Duration::from_millis(parse_or("POLL_INTERVAL_MS", 200u64)?),
            poll_backoff: Duration::from_secs(parse_or("POLL_BACKOFF_SECS", 5u64)?),
            http_timeout: Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", 30u64)?),
        })
    }
}

// --- Env helpers -----------------------------------------------------------

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => {
            v.trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value: v })
        }
        _ => Ok(default),
    }
}

fn decimal_or(key: &'static str, default: Decimal) -> Result<Decimal, ConfigError> {
    parse_or(key, default)
}

fn decimal_opt(key: &'static str) -> Result<Option<Decimal>, ConfigError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: v }),
        _ => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_mode_parses_case_insensitively() {
        assert_eq!("RELAY".parse::<WalletMode>().unwrap(), WalletMode::Relay);
        assert_eq!("direct".parse::<WalletMode>().unwrap(), WalletMode::Direct);
        assert!("proxy".parse::<WalletMode>().is_err());
    }
}

pub mod auth;
pub mod clob_client;
pub mod data_client;
pub mod types;

pub use auth::ClobAuth;
pub use clob_client::{ClobClient, ClobClientError};
pub use data_client::{DataClient, DataClientError};
pub use types::{ApiActivity, ApiOrder, ApiPosition, OrderAck, OrderRequest, OrderType};

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Read side of the market data layer: activity feed, positions, balances.
/// The pipeline only ever talks to this trait; `DataClient` is the live
/// REST implementation and tests inject in-memory fakes.
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// Recent activity records for one trader, newest first as the feed
    /// returns them.
    async fn get_activity(&self, trader: &str) -> Result<Vec<ApiActivity>, DataClientError>;

    /// All open positions for an address.
    async fn get_positions(&self, address: &str) -> Result<Vec<ApiPosition>, DataClientError>;

    /// USDC balance for an address.
    async fn get_usdc_balance(&self, address: &str) -> Result<Decimal, DataClientError>;
}

/// Order entry and management on the exchange. Signing and transport live
/// behind this seam; the pipeline treats acceptance rules (price bounds,
/// minimum notional) as external contracts it must satisfy up front.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderAck, ClobClientError>;

    async fn get_order(&self, order_id: &str) -> Result<ApiOrder, ClobClientError>;

    async fn cancel_order(&self, order_id: &str) -> Result<(), ClobClientError>;
}

pub mod activity_poller;
pub mod rate_limiter;
pub mod watermark;

pub use activity_poller::{normalize_activity, run_activity_poller, NormalizeError, PollerConfig};
pub use rate_limiter::RateLimiter;
pub use watermark::TraderWatermark;

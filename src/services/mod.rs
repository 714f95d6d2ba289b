pub mod snapshots;
pub mod stats;

pub use snapshots::{PositionSnapshot, SnapshotStore};
pub use stats::{PipelineStats, StatsSnapshot};

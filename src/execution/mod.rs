pub mod copy_engine;
pub mod lifecycle;
pub mod pricing;
pub mod queue;
pub mod sizer;
pub mod submitter;
pub mod validator;

pub use copy_engine::{run_copy_engine, EngineContext};
pub use lifecycle::{manage_order, LifecycleConfig};
pub use pricing::PricingEngine;
pub use queue::{ExecutionQueue, QueueItem};
pub use sizer::{OrderPlan, OrderSizer, SizerConfig, SizingInputs, SizingRejection};
pub use submitter::{OrderSubmitter, SubmitError, SubmitOutcome};
pub use validator::{SignalValidator, ValidationError};

//! Funnel conversion engine
//!
//! Given each entity's chronologically ordered events and an ordered step
//! sequence, determines how far every entity progressed and aggregates
//! per-step counts and membership in one pass over the event source.

pub mod accumulator;
pub mod aggregator;
pub mod error;
pub mod matcher;
pub mod plan;
pub mod results;
pub mod scanner;
pub mod service;
pub mod testing;

// Re-export the engine surface
pub use accumulator::FunnelAccumulator;
pub use aggregator::FunnelAggregator;
pub use error::FunnelError;
pub use matcher::step_matches;
pub use plan::{compile_plan, ActionPolicy};
pub use results::{build_results, StepResult};
pub use scanner::{scan, MatchedStep, ScanResult};
pub use service::{FunnelMetrics, FunnelService, StepConversion};

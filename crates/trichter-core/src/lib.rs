//! Core data model and funnel definitions shared across Trichter crates

pub mod definition;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use definition::{
    ActionDefinition, EventPredicate, FunnelPlan, FunnelRequest, PropertyFilter, StepCriteria,
    StepDefinition, StepRequest,
};
pub use error::DefinitionError;
pub use types::{EntityTimeline, EventRecord, TimeWindow, UtcDateTime};

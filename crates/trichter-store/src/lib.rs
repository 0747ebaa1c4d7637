//! Store boundary for the Trichter funnel engine
//!
//! Defines the traits the engine consumes ([`EventSource`], [`ActionResolver`])
//! and in-memory realizations used by tests and in-process embedders.

pub mod memory;
pub mod traits;

pub use memory::{MemoryActionResolver, MemoryEventStore, NewEvent};
pub use traits::{ActionResolver, EventSource, StoreError, TimelineQuery};

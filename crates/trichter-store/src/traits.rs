//! Boundary contracts the funnel engine consumes
//!
//! The engine has no storage of its own. Anything that can hand back
//! per-entity timelines in one retrieval can drive a funnel run.

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

use trichter_core::{ActionDefinition, EntityTimeline, TimeWindow};

/// Errors surfaced by event stores and action resolvers.
///
/// Any store error aborts the funnel run; the engine never returns partial
/// results over a failed retrieval.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("event store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Retrieval parameters for one funnel run.
#[derive(Debug, Clone, Default)]
pub struct TimelineQuery {
    pub window: TimeWindow,
    /// When set, the store may drop events whose name is outside this set;
    /// they are provably irrelevant to matching. It must never drop events
    /// whose name is inside the set.
    pub event_names: Option<HashSet<String>>,
}

/// An append-only, per-entity, time-ordered event store.
///
/// One call returns every entity with its full event set grouped as a unit,
/// in a stable first-seen order. Timelines need not be pre-sorted; the
/// engine sorts defensively.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_timelines(&self, query: &TimelineQuery)
        -> Result<Vec<EntityTimeline>, StoreError>;
}

/// Resolves an action identifier into its current predicate set.
///
/// `Ok(None)` means the action does not exist; how that is treated (hard
/// failure or a never-matching step) is the caller's policy.
#[async_trait]
pub trait ActionResolver: Send + Sync {
    async fn resolve(&self, action_id: &str) -> Result<Option<ActionDefinition>, StoreError>;
}

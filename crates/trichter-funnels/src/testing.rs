//! Shared helpers for engine tests and the conformance suite
//!
//! Exposed unconditionally (like a test_utils module) so integration tests
//! and downstream store implementations can reuse them when verifying the
//! engine contracts against their own `EventSource`.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use trichter_core::{
    EntityTimeline, EventPredicate, FunnelPlan, PropertyFilter, StepCriteria, StepDefinition,
};
use trichter_store::{EventSource, StoreError, TimelineQuery};

/// Wraps an `EventSource` and counts retrievals, to assert the
/// one-logical-traversal contract: a funnel run must fetch exactly once.
pub struct CountingEventSource<S> {
    inner: Arc<S>,
    fetches: AtomicUsize,
}

impl<S: EventSource> CountingEventSource<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: EventSource> EventSource for CountingEventSource<S> {
    async fn fetch_timelines(
        &self,
        query: &TimelineQuery,
    ) -> Result<Vec<EntityTimeline>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_timelines(query).await
    }
}

/// An `EventSource` that always fails, for abort-path tests.
pub struct FailingEventSource;

#[async_trait]
impl EventSource for FailingEventSource {
    async fn fetch_timelines(
        &self,
        _query: &TimelineQuery,
    ) -> Result<Vec<EntityTimeline>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Build a plain event step.
pub fn event_step(index: usize, name: &str) -> StepDefinition {
    StepDefinition {
        index,
        label: name.to_string(),
        criteria: StepCriteria::Event(EventPredicate::named(name)),
    }
}

/// Build an event step with a single exact-match property filter.
pub fn filtered_step(index: usize, name: &str, key: &str, value: serde_json::Value) -> StepDefinition {
    StepDefinition {
        index,
        label: name.to_string(),
        criteria: StepCriteria::Event(EventPredicate {
            event_name: name.to_string(),
            filters: vec![PropertyFilter::Exact {
                key: key.to_string(),
                value,
            }],
        }),
    }
}

/// Build a plan from plain event-name steps.
pub fn event_plan(name: &str, step_names: &[&str]) -> FunnelPlan {
    let steps = step_names
        .iter()
        .enumerate()
        .map(|(index, step_name)| event_step(index, step_name))
        .collect();
    FunnelPlan::new(name, steps).expect("non-empty plan")
}

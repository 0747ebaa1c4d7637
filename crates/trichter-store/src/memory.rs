//! In-memory realizations of the store boundary
//!
//! `MemoryEventStore` backs the conformance suite and doubles as a default
//! for embedders that already hold their events in process. It assigns the
//! ingestion sequence number on append, so ordering ties are explicit
//! rather than an artifact of insertion order.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use trichter_core::{ActionDefinition, EntityTimeline, EventRecord, UtcDateTime};

use crate::traits::{ActionResolver, EventSource, StoreError, TimelineQuery};

/// An event handed to the store; the store fills in the sequence number.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub entity_id: String,
    pub name: String,
    pub timestamp: UtcDateTime,
    pub properties: serde_json::Map<String, Value>,
}

impl NewEvent {
    pub fn new(entity_id: impl Into<String>, name: impl Into<String>, timestamp: UtcDateTime) -> Self {
        Self {
            entity_id: entity_id.into(),
            name: name.into(),
            timestamp,
            properties: serde_json::Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

#[derive(Default)]
struct StoreInner {
    events: Vec<EventRecord>,
    next_sequence: u64,
    /// Entity ids in first-append order; fixes the retrieval ordering.
    entity_order: Vec<String>,
}

/// Append-only in-memory event store.
#[derive(Default)]
pub struct MemoryEventStore {
    inner: RwLock<StoreInner>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event, assigning its ingestion sequence number.
    pub fn append(&self, event: NewEvent) -> EventRecord {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        if !inner.entity_order.iter().any(|id| *id == event.entity_id) {
            inner.entity_order.push(event.entity_id.clone());
        }
        let record = EventRecord {
            entity_id: event.entity_id,
            name: event.name,
            timestamp: event.timestamp,
            sequence,
            properties: event.properties,
        };
        inner.events.push(record.clone());
        record
    }

    pub fn event_count(&self) -> usize {
        self.inner.read().expect("store lock poisoned").events.len()
    }
}

#[async_trait]
impl EventSource for MemoryEventStore {
    async fn fetch_timelines(
        &self,
        query: &TimelineQuery,
    ) -> Result<Vec<EntityTimeline>, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");

        let mut grouped: HashMap<&str, Vec<EventRecord>> = HashMap::new();
        for event in &inner.events {
            if !query.window.contains(event.timestamp) {
                continue;
            }
            if let Some(names) = &query.event_names {
                if !names.contains(&event.name) {
                    continue;
                }
            }
            grouped
                .entry(event.entity_id.as_str())
                .or_default()
                .push(event.clone());
        }

        // Retrieval order follows first-append order of each entity, so two
        // runs over the same store produce identical output ordering.
        let timelines: Vec<EntityTimeline> = inner
            .entity_order
            .iter()
            .filter_map(|entity_id| {
                grouped
                    .remove(entity_id.as_str())
                    .map(|events| EntityTimeline::new(entity_id.clone(), events))
            })
            .collect();

        debug!(
            entities = timelines.len(),
            prefiltered = query.event_names.is_some(),
            "fetched timelines from memory store"
        );
        Ok(timelines)
    }
}

/// In-memory action registry.
#[derive(Default)]
pub struct MemoryActionResolver {
    actions: RwLock<HashMap<String, ActionDefinition>>,
}

impl MemoryActionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&self, action: ActionDefinition) {
        self.actions
            .write()
            .expect("resolver lock poisoned")
            .insert(action.id.clone(), action);
    }
}

#[async_trait]
impl ActionResolver for MemoryActionResolver {
    async fn resolve(&self, action_id: &str) -> Result<Option<ActionDefinition>, StoreError> {
        Ok(self
            .actions
            .read()
            .expect("resolver lock poisoned")
            .get(action_id)
            .cloned())
    }
}

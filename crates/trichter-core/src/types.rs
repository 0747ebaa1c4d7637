//! Event data model shared across all Trichter crates

use chrono::{DateTime as ChronoDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard UTC DateTime type used across all Trichter crates
///
/// Serializes as ISO 8601 with 'Z' suffix: `2025-10-12T12:15:47.609192Z`
pub type UtcDateTime = ChronoDateTime<Utc>;

/// A single event emitted by an entity.
///
/// `sequence` is the ingestion sequence number assigned by the event store.
/// It makes the ordering key `(timestamp, sequence)` explicit so that
/// same-timestamp events sort deterministically instead of relying on
/// insertion order as an implementation accident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub entity_id: String,
    pub name: String,
    pub timestamp: UtcDateTime,
    pub sequence: u64,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

impl EventRecord {
    /// Ordering key for timeline sorting: timestamp first, ingestion
    /// sequence as the stable tie-break.
    pub fn ordering_key(&self) -> (UtcDateTime, u64) {
        (self.timestamp, self.sequence)
    }

    /// Look up a property value by key.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// One entity's events, to be scanned against a funnel.
///
/// The scanner requires events sorted ascending by `(timestamp, sequence)`.
/// Callers that cannot guarantee this must call [`EntityTimeline::sort`];
/// the aggregator sorts defensively before every scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTimeline {
    pub entity_id: String,
    pub events: Vec<EventRecord>,
}

impl EntityTimeline {
    pub fn new(entity_id: impl Into<String>, events: Vec<EventRecord>) -> Self {
        Self {
            entity_id: entity_id.into(),
            events,
        }
    }

    /// Stable sort by the ordering key. Idempotent.
    pub fn sort(&mut self) {
        self.events.sort_by_key(|e| e.ordering_key());
    }

    pub fn is_sorted(&self) -> bool {
        self.events
            .windows(2)
            .all(|w| w[0].ordering_key() <= w[1].ordering_key())
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

/// Half-open time window applied when fetching timelines from a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Option<UtcDateTime>,
    pub end: Option<UtcDateTime>,
}

impl TimeWindow {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, ts: UtcDateTime) -> bool {
        if let Some(start) = self.start {
            if ts < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if ts > end {
                return false;
            }
        }
        true
    }
}

//! Timeline scanning: how far did one entity progress through the funnel?
//!
//! A single forward pass over the entity's time-ordered events. Greedy,
//! leftmost-match, no backtracking: the first event satisfying the current
//! target step is taken immediately, unrelated events are skipped without
//! being consumed, and a previously matched step is never un-matched. An
//! event for step i that occurs chronologically before the event matched
//! for step i-1 never counts.

use trichter_core::{EntityTimeline, StepDefinition, UtcDateTime};

use crate::matcher::step_matches;

/// The event that satisfied one step.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedStep {
    pub step_index: usize,
    pub timestamp: UtcDateTime,
    pub sequence: u64,
}

/// Outcome of scanning one entity against a step sequence.
///
/// `matched` holds one entry per satisfied step, in step order. Scanning is
/// total: an entity that satisfies nothing yields an empty result, not an
/// error.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    matched: Vec<MatchedStep>,
}

impl ScanResult {
    /// Highest step index reached, `None` if no step matched.
    pub fn reached_step(&self) -> Option<usize> {
        self.matched.last().map(|m| m.step_index)
    }

    /// Number of steps satisfied (reached_step + 1).
    pub fn steps_satisfied(&self) -> usize {
        self.matched.len()
    }

    pub fn matched(&self) -> &[MatchedStep] {
        &self.matched
    }
}

/// Scan a sorted timeline against the funnel's steps.
///
/// Precondition: `timeline` is sorted ascending by `(timestamp, sequence)`.
/// The aggregator sorts defensively before calling; direct callers must do
/// the same. O(events) matcher invocations, independent of step count.
pub fn scan(timeline: &EntityTimeline, steps: &[StepDefinition]) -> ScanResult {
    debug_assert!(timeline.is_sorted(), "timeline must be sorted before scanning");

    let mut matched: Vec<MatchedStep> = Vec::new();
    let mut last_matched_at: Option<UtcDateTime> = None;

    for event in &timeline.events {
        // Funnel fully completed; remaining events are irrelevant.
        let Some(target) = steps.get(matched.len()) else {
            break;
        };
        if step_matches(event, target)
            && last_matched_at.is_none_or(|prev| event.timestamp >= prev)
        {
            matched.push(MatchedStep {
                step_index: target.index,
                timestamp: event.timestamp,
                sequence: event.sequence,
            });
            last_matched_at = Some(event.timestamp);
        }
    }

    ScanResult { matched }
}

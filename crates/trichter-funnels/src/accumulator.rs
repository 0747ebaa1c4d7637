//! Per-step accumulation of counts, membership, and step timings
//!
//! Mutable only during one funnel run: one write per entity per step, then
//! read-only while results are built. Membership lists preserve the order
//! entities were recorded in, which the aggregator keeps aligned with the
//! store's first-seen entity order.

use crate::scanner::ScanResult;

#[derive(Debug, Default, Clone)]
struct StepBucket {
    /// Entity ids that reached this step, in recording order. Duplicates are
    /// impossible because each entity is scanned exactly once per run.
    members: Vec<String>,
    /// Sum of seconds between this step's match and the previous step's
    /// match, across all entities that reached this step.
    seconds_from_previous: i64,
}

/// Accumulated state of one funnel run.
///
/// Invariants: `count(i) == members(i).len()` (structural — counts are
/// derived from membership) and `members(i) ⊇ members(i + 1)`.
#[derive(Debug, Clone)]
pub struct FunnelAccumulator {
    buckets: Vec<StepBucket>,
    /// Sum of first-step-to-last-step seconds over fully converted entities.
    completion_seconds: i64,
}

impl FunnelAccumulator {
    pub fn new(step_count: usize) -> Self {
        Self {
            buckets: vec![StepBucket::default(); step_count],
            completion_seconds: 0,
        }
    }

    pub fn step_count(&self) -> usize {
        self.buckets.len()
    }

    /// Fold one entity's scan outcome in. At most one write per step.
    pub fn record(&mut self, entity_id: &str, result: &ScanResult) {
        let matched = result.matched();
        for step in matched {
            let bucket = &mut self.buckets[step.step_index];
            bucket.members.push(entity_id.to_string());
            if step.step_index > 0 {
                let previous = &matched[step.step_index - 1];
                bucket.seconds_from_previous +=
                    step.timestamp.signed_duration_since(previous.timestamp).num_seconds();
            }
        }
        if matched.len() == self.buckets.len() {
            if let (Some(first), Some(last)) = (matched.first(), matched.last()) {
                self.completion_seconds +=
                    last.timestamp.signed_duration_since(first.timestamp).num_seconds();
            }
        }
    }

    /// Merge a partial accumulator produced by a worker shard. Shards must be
    /// merged in source order to keep membership ordering deterministic.
    pub fn merge(&mut self, other: FunnelAccumulator) {
        debug_assert_eq!(self.buckets.len(), other.buckets.len());
        for (bucket, partial) in self.buckets.iter_mut().zip(other.buckets) {
            bucket.members.extend(partial.members);
            bucket.seconds_from_previous += partial.seconds_from_previous;
        }
        self.completion_seconds += other.completion_seconds;
    }

    pub fn count(&self, step_index: usize) -> u64 {
        self.buckets[step_index].members.len() as u64
    }

    pub fn members(&self, step_index: usize) -> &[String] {
        &self.buckets[step_index].members
    }

    /// Mean seconds from the previous step's match, 0.0 for the first step
    /// or when nobody reached this step.
    pub fn average_seconds_from_previous(&self, step_index: usize) -> f64 {
        if step_index == 0 {
            return 0.0;
        }
        let bucket = &self.buckets[step_index];
        if bucket.members.is_empty() {
            0.0
        } else {
            bucket.seconds_from_previous as f64 / bucket.members.len() as f64
        }
    }

    /// Mean seconds from first to last step over fully converted entities.
    pub fn average_completion_seconds(&self) -> f64 {
        match self.buckets.last() {
            Some(last) if !last.members.is_empty() => {
                self.completion_seconds as f64 / last.members.len() as f64
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;
    use chrono::{TimeZone, Utc};
    use trichter_core::{EntityTimeline, EventPredicate, EventRecord, StepCriteria, StepDefinition};

    fn step(index: usize, name: &str) -> StepDefinition {
        StepDefinition {
            index,
            label: name.to_string(),
            criteria: StepCriteria::Event(EventPredicate::named(name)),
        }
    }

    fn timeline(entity: &str, events: &[(&str, i64)]) -> EntityTimeline {
        let records = events
            .iter()
            .enumerate()
            .map(|(i, (name, secs))| EventRecord {
                entity_id: entity.to_string(),
                name: name.to_string(),
                timestamp: Utc.timestamp_opt(*secs, 0).unwrap(),
                sequence: i as u64,
                properties: serde_json::Map::new(),
            })
            .collect();
        EntityTimeline::new(entity, records)
    }

    #[test]
    fn record_writes_every_reached_step_once() {
        let steps = [step(0, "signup"), step(1, "$pageview")];
        let mut acc = FunnelAccumulator::new(2);

        acc.record("a", &scan(&timeline("a", &[("signup", 1), ("$pageview", 11)]), &steps));
        acc.record("b", &scan(&timeline("b", &[("signup", 1)]), &steps));
        acc.record("c", &scan(&timeline("c", &[("noise", 1)]), &steps));

        assert_eq!(acc.count(0), 2);
        assert_eq!(acc.count(1), 1);
        assert_eq!(acc.members(0), ["a", "b"]);
        assert_eq!(acc.members(1), ["a"]);
        assert_eq!(acc.average_seconds_from_previous(1), 10.0);
        assert_eq!(acc.average_completion_seconds(), 10.0);
    }

    #[test]
    fn merge_preserves_shard_order_and_sums() {
        let steps = [step(0, "signup")];
        let mut left = FunnelAccumulator::new(1);
        left.record("a", &scan(&timeline("a", &[("signup", 1)]), &steps));
        let mut right = FunnelAccumulator::new(1);
        right.record("b", &scan(&timeline("b", &[("signup", 2)]), &steps));

        left.merge(right);
        assert_eq!(left.count(0), 2);
        assert_eq!(left.members(0), ["a", "b"]);
    }

    #[test]
    fn membership_is_monotonic_across_steps() {
        let steps = [step(0, "a"), step(1, "b"), step(2, "c")];
        let mut acc = FunnelAccumulator::new(3);
        acc.record("x", &scan(&timeline("x", &[("a", 1), ("b", 2), ("c", 3)]), &steps));
        acc.record("y", &scan(&timeline("y", &[("a", 1), ("b", 2)]), &steps));
        acc.record("z", &scan(&timeline("z", &[("a", 1)]), &steps));

        for i in 0..2 {
            let narrower = acc.members(i + 1);
            assert!(narrower.iter().all(|m| acc.members(i).contains(m)));
            assert!(acc.count(i) >= acc.count(i + 1));
        }
    }
}

//! Shaping accumulated state into ordered per-step results

use serde::Serialize;

use trichter_core::StepDefinition;

use crate::accumulator::FunnelAccumulator;

/// One step's share of the funnel outcome.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step_index: usize,
    pub label: String,
    pub count: u64,
    /// Entity ids that reached this step, in deterministic first-seen order.
    pub members: Vec<String>,
}

/// Render the accumulator in step-definition order. No reordering,
/// filtering, or deduplication beyond what the accumulator guarantees.
pub fn build_results(accumulator: &FunnelAccumulator, steps: &[StepDefinition]) -> Vec<StepResult> {
    debug_assert_eq!(accumulator.step_count(), steps.len());
    steps
        .iter()
        .map(|step| StepResult {
            step_index: step.index,
            label: step.label.clone(),
            count: accumulator.count(step.index),
            members: accumulator.members(step.index).to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;
    use chrono::{TimeZone, Utc};
    use trichter_core::{EntityTimeline, EventPredicate, EventRecord, StepCriteria};

    #[test]
    fn results_follow_definition_order_with_counts_matching_members() {
        let steps: Vec<StepDefinition> = ["signup", "$pageview"]
            .iter()
            .enumerate()
            .map(|(index, name)| StepDefinition {
                index,
                label: name.to_string(),
                criteria: StepCriteria::Event(EventPredicate::named(*name)),
            })
            .collect();

        let mut acc = FunnelAccumulator::new(2);
        let events = vec![
            EventRecord {
                entity_id: "a".to_string(),
                name: "signup".to_string(),
                timestamp: Utc.timestamp_opt(1, 0).unwrap(),
                sequence: 0,
                properties: serde_json::Map::new(),
            },
            EventRecord {
                entity_id: "a".to_string(),
                name: "$pageview".to_string(),
                timestamp: Utc.timestamp_opt(2, 0).unwrap(),
                sequence: 1,
                properties: serde_json::Map::new(),
            },
        ];
        acc.record("a", &scan(&EntityTimeline::new("a", events), &steps));

        let results = build_results(&acc, &steps);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].step_index, 0);
        assert_eq!(results[0].label, "signup");
        assert_eq!(results[1].step_index, 1);
        for result in &results {
            assert_eq!(result.count, result.members.len() as u64);
        }
    }
}

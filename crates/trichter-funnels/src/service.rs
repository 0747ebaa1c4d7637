//! Service facade: compile, run, and present a funnel in one call

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use trichter_core::{FunnelRequest, TimeWindow};
use trichter_store::{ActionResolver, EventSource};

use crate::aggregator::FunnelAggregator;
use crate::error::FunnelError;
use crate::plan::{compile_plan, ActionPolicy};
use crate::results::{build_results, StepResult};

/// Presentation metrics for one funnel run.
#[derive(Debug, Serialize)]
pub struct FunnelMetrics {
    pub funnel_name: String,
    pub total_entries: u64,
    pub steps: Vec<StepConversion>,
    pub overall_conversion_rate: f64,
    pub average_completion_time_seconds: f64,
}

/// One step's result plus conversion figures relative to the previous step.
#[derive(Debug, Serialize)]
pub struct StepConversion {
    #[serde(flatten)]
    pub result: StepResult,
    /// Percentage of the previous step's entities that completed this step
    pub conversion_rate: f64,
    pub drop_off_rate: f64,
    pub average_time_to_complete_seconds: f64,
}

pub struct FunnelService {
    source: Arc<dyn EventSource>,
    resolver: Arc<dyn ActionResolver>,
    action_policy: ActionPolicy,
}

impl FunnelService {
    pub fn new(source: Arc<dyn EventSource>, resolver: Arc<dyn ActionResolver>) -> Self {
        Self {
            source,
            resolver,
            action_policy: ActionPolicy::default(),
        }
    }

    /// Fail runs whose action steps reference unknown actions instead of
    /// treating them as never-matching.
    pub fn with_strict_actions(mut self) -> Self {
        self.action_policy = ActionPolicy::Strict;
        self
    }

    /// Compile the request, run the aggregation, and derive conversion
    /// percentages. One event-store retrieval per call.
    pub async fn run_funnel(
        &self,
        request: &FunnelRequest,
        window: TimeWindow,
    ) -> Result<FunnelMetrics, FunnelError> {
        let plan = compile_plan(request, self.resolver.as_ref(), self.action_policy).await?;
        let accumulator = FunnelAggregator::run(self.source.as_ref(), &plan, window).await?;
        let results = build_results(&accumulator, plan.steps());

        let total_entries = results.first().map(|r| r.count).unwrap_or(0);
        let final_count = results.last().map(|r| r.count).unwrap_or(0);

        let mut previous_count = total_entries;
        let mut steps = Vec::with_capacity(results.len());
        for result in results {
            let conversion_rate = if previous_count > 0 {
                (result.count as f64 / previous_count as f64) * 100.0
            } else {
                0.0
            };
            debug!(
                step = result.step_index,
                label = %result.label,
                count = result.count,
                conversion_rate,
                "funnel step computed"
            );
            previous_count = result.count;
            steps.push(StepConversion {
                average_time_to_complete_seconds: accumulator
                    .average_seconds_from_previous(result.step_index),
                conversion_rate,
                drop_off_rate: 100.0 - conversion_rate,
                result,
            });
        }

        let overall_conversion_rate = if total_entries > 0 {
            (final_count as f64 / total_entries as f64) * 100.0
        } else {
            0.0
        };

        Ok(FunnelMetrics {
            funnel_name: request.name.clone(),
            total_entries,
            steps,
            overall_conversion_rate,
            average_completion_time_seconds: accumulator.average_completion_seconds(),
        })
    }
}

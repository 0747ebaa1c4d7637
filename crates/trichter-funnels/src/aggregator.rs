//! Funnel aggregation: one logical traversal of the event source
//!
//! Fetches every entity's grouped timeline in a single retrieval, scans each
//! entity independently, and folds the outcomes into a [`FunnelAccumulator`].
//! Entities share no mutable state while scanning, so they are partitioned
//! into contiguous shards in source order, scanned on separate workers into
//! private partial accumulators, and merged shard-by-shard. The merge order
//! keeps membership lists aligned with the store's first-seen entity order,
//! so output is deterministic across runs.

use std::sync::Arc;
use std::thread::available_parallelism;
use tracing::debug;

use trichter_core::{EntityTimeline, FunnelPlan, StepDefinition, TimeWindow};
use trichter_store::{EventSource, TimelineQuery};

use crate::accumulator::FunnelAccumulator;
use crate::error::FunnelError;
use crate::scanner::scan;

pub struct FunnelAggregator;

impl FunnelAggregator {
    /// Run the plan over every entity the source returns for the window.
    ///
    /// Exactly one `fetch_timelines` call per run; the retrieval is
    /// prefiltered to the union of event names the plan references. Store
    /// errors abort the run with no partial results. Empty timelines and
    /// never-matching steps are valid zero data.
    pub async fn run(
        source: &dyn EventSource,
        plan: &FunnelPlan,
        window: TimeWindow,
    ) -> Result<FunnelAccumulator, FunnelError> {
        let query = TimelineQuery {
            window,
            event_names: Some(plan.referenced_event_names()),
        };
        let timelines = source.fetch_timelines(&query).await?;
        debug!(
            funnel = plan.name(),
            entities = timelines.len(),
            steps = plan.step_count(),
            "starting funnel aggregation"
        );

        let shard_count = available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(timelines.len().max(1));
        let steps: Arc<[StepDefinition]> = plan.steps().to_vec().into();

        let mut handles = Vec::with_capacity(shard_count);
        for shard in partition(timelines, shard_count) {
            let steps = Arc::clone(&steps);
            handles.push(tokio::task::spawn_blocking(move || scan_shard(shard, &steps)));
        }

        // Shards merge in source order; partial accumulators are internally
        // consistent, so abort between shards leaves no corrupt state.
        let mut accumulator = FunnelAccumulator::new(steps.len());
        for handle in handles {
            accumulator.merge(handle.await?);
        }
        debug!(
            funnel = plan.name(),
            entered = accumulator.count(0),
            "funnel aggregation finished"
        );
        Ok(accumulator)
    }
}

fn scan_shard(shard: Vec<EntityTimeline>, steps: &[StepDefinition]) -> FunnelAccumulator {
    let mut partial = FunnelAccumulator::new(steps.len());
    for mut timeline in shard {
        // Defensive: sources may not guarantee sort order. O(k log k) per
        // entity removes the unsorted-timeline failure class entirely.
        timeline.sort();
        let result = scan(&timeline, steps);
        partial.record(&timeline.entity_id, &result);
    }
    partial
}

/// Split into at most `shards` contiguous chunks, preserving order.
fn partition(timelines: Vec<EntityTimeline>, shards: usize) -> Vec<Vec<EntityTimeline>> {
    if timelines.is_empty() {
        return Vec::new();
    }
    let chunk_size = timelines.len().div_ceil(shards);
    let mut chunks = Vec::with_capacity(shards);
    let mut current = Vec::with_capacity(chunk_size);
    for timeline in timelines {
        current.push(timeline);
        if current.len() == chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

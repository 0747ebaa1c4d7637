//! Step matching: does a single event satisfy a single step?
//!
//! Pure functions of their inputs, so the scanner stays decoupled from
//! filter-evaluation details and matching is unit-testable with synthetic
//! events.

use trichter_core::{EventPredicate, EventRecord, PropertyFilter, StepCriteria, StepDefinition};

/// True iff `event` satisfies `step`'s criteria.
///
/// Event criteria: name equality AND every filter clause. Action criteria:
/// any predicate in the set (OR across predicates, AND within one).
pub fn step_matches(event: &EventRecord, step: &StepDefinition) -> bool {
    match &step.criteria {
        StepCriteria::Event(predicate) => predicate_matches(event, predicate),
        StepCriteria::Action { predicates, .. } => {
            predicates.iter().any(|p| predicate_matches(event, p))
        }
    }
}

fn predicate_matches(event: &EventRecord, predicate: &EventPredicate) -> bool {
    event.name == predicate.event_name
        && predicate.filters.iter().all(|f| filter_matches(event, f))
}

/// A missing property fails the clause for every operator.
fn filter_matches(event: &EventRecord, filter: &PropertyFilter) -> bool {
    match filter {
        PropertyFilter::Exact { key, value } => {
            event.property(key).is_some_and(|actual| actual == value)
        }
        PropertyFilter::IsOneOf { key, values } => event
            .property(key)
            .is_some_and(|actual| values.iter().any(|candidate| candidate == actual)),
    }
}

//! Funnel definitions: property filters, step criteria, and the compiled plan
//!
//! Configuration parsing is strictly separated from the matching engine. A
//! [`FunnelRequest`] is the mutable, serde-facing configuration object; a
//! [`FunnelPlan`] is the validated, immutable step sequence the engine runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::error::DefinitionError;

/// A single conjunctive property filter clause.
///
/// A missing property always evaluates false, for every operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "operator")]
pub enum PropertyFilter {
    /// Property value equals the expected JSON value
    Exact { key: String, value: Value },
    /// Property value is one of the given JSON values
    IsOneOf { key: String, values: Vec<Value> },
}

impl PropertyFilter {
    pub fn key(&self) -> &str {
        match self {
            PropertyFilter::Exact { key, .. } => key,
            PropertyFilter::IsOneOf { key, .. } => key,
        }
    }
}

/// One event-name/property-filter combination.
///
/// Filters are ANDed within a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPredicate {
    pub event_name: String,
    #[serde(default)]
    pub filters: Vec<PropertyFilter>,
}

impl EventPredicate {
    pub fn named(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            filters: Vec::new(),
        }
    }
}

/// A named, resolver-defined OR-set of event predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub id: String,
    pub name: String,
    pub predicates: Vec<EventPredicate>,
}

/// What a step matches against.
///
/// `Action` carries the predicates resolved at plan-compile time; an empty
/// predicate set is legal and matches nothing (the lenient posture for a
/// missing action definition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StepCriteria {
    Event(EventPredicate),
    Action {
        action_id: String,
        predicates: Vec<EventPredicate>,
    },
}

/// One position in a funnel. Immutable once a run begins.
///
/// Two steps may carry identical criteria (repeat steps); they stay distinct
/// by `index` and each requires a separate qualifying event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub index: usize,
    pub label: String,
    pub criteria: StepCriteria,
}

impl StepDefinition {
    /// Event names this step can possibly match. Used to build the store
    /// prefilter; never narrower than what the criteria accept.
    pub fn referenced_event_names(&self) -> impl Iterator<Item = &str> {
        let predicates: &[EventPredicate] = match &self.criteria {
            StepCriteria::Event(predicate) => std::slice::from_ref(predicate),
            StepCriteria::Action { predicates, .. } => predicates,
        };
        predicates.iter().map(|p| p.event_name.as_str())
    }
}

/// Request to run (or save) a funnel. The serde-facing configuration layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelRequest {
    pub name: String,
    pub steps: Vec<StepRequest>,
}

/// One requested step: a literal event name plus filters, or an action id
/// to be resolved into its predicate set before the run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum StepRequest {
    Event {
        event_name: String,
        #[serde(default)]
        filters: Vec<PropertyFilter>,
    },
    Action {
        action_id: String,
    },
}

/// The validated, immutable step sequence a funnel run executes.
#[derive(Debug, Clone)]
pub struct FunnelPlan {
    name: String,
    steps: Vec<StepDefinition>,
}

impl FunnelPlan {
    /// Validate and freeze a step sequence. Fails fast on an empty funnel.
    pub fn new(
        name: impl Into<String>,
        steps: Vec<StepDefinition>,
    ) -> Result<Self, DefinitionError> {
        if steps.is_empty() {
            return Err(DefinitionError::EmptyFunnel);
        }
        debug_assert!(steps.iter().enumerate().all(|(i, s)| s.index == i));
        Ok(Self {
            name: name.into(),
            steps,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Union of event names any step can match. A store may prefilter
    /// retrieval to exactly this set; events outside it are provably
    /// irrelevant to matching.
    pub fn referenced_event_names(&self) -> HashSet<String> {
        self.steps
            .iter()
            .flat_map(|s| s.referenced_event_names().map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_step(index: usize, name: &str) -> StepDefinition {
        StepDefinition {
            index,
            label: name.to_string(),
            criteria: StepCriteria::Event(EventPredicate::named(name)),
        }
    }

    #[test]
    fn empty_funnel_is_rejected() {
        let err = FunnelPlan::new("empty", vec![]).unwrap_err();
        assert!(matches!(err, DefinitionError::EmptyFunnel));
    }

    #[test]
    fn referenced_names_cover_actions_and_events() {
        let plan = FunnelPlan::new(
            "mixed",
            vec![
                event_step(0, "user signed up"),
                StepDefinition {
                    index: 1,
                    label: "sign up".to_string(),
                    criteria: StepCriteria::Action {
                        action_id: "a1".to_string(),
                        predicates: vec![
                            EventPredicate::named("sign up"),
                            EventPredicate::named("clicked cta"),
                        ],
                    },
                },
            ],
        )
        .unwrap();

        let names = plan.referenced_event_names();
        assert_eq!(names.len(), 3);
        assert!(names.contains("user signed up"));
        assert!(names.contains("sign up"));
        assert!(names.contains("clicked cta"));
    }

    #[test]
    fn step_request_deserializes_tagged_filters() {
        let raw = json!({
            "type": "event",
            "event_name": "$pageview",
            "filters": [
                {"operator": "exact", "key": "$current_url", "value": "aloha.com"},
                {"operator": "is_one_of", "key": "plan", "values": ["pro", "team"]}
            ]
        });
        let step: StepRequest = serde_json::from_value(raw).unwrap();
        match step {
            StepRequest::Event {
                event_name,
                filters,
            } => {
                assert_eq!(event_name, "$pageview");
                assert_eq!(filters.len(), 2);
                assert_eq!(filters[0].key(), "$current_url");
            }
            other => panic!("expected event step, got {other:?}"),
        }
    }
}

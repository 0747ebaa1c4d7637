//! Compiling a funnel request into an immutable plan
//!
//! Configuration parsing and the matching engine stay strictly separated:
//! action ids are resolved into their predicate sets here, before any
//! scanning begins, so the scanner never consults the resolver.

use tracing::warn;

use trichter_core::{
    DefinitionError, EventPredicate, FunnelPlan, FunnelRequest, StepCriteria, StepDefinition,
    StepRequest,
};
use trichter_store::ActionResolver;

use crate::error::FunnelError;

/// How to treat a step whose action the resolver cannot find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionPolicy {
    /// The step legitimately matches nothing; entities cannot progress
    /// past it. Not a run-level failure.
    #[default]
    Lenient,
    /// Fail the run before scanning begins.
    Strict,
}

/// Validate the request and resolve action steps into predicate sets.
pub async fn compile_plan(
    request: &FunnelRequest,
    resolver: &dyn ActionResolver,
    policy: ActionPolicy,
) -> Result<FunnelPlan, FunnelError> {
    let mut steps = Vec::with_capacity(request.steps.len());
    for (index, step) in request.steps.iter().enumerate() {
        let definition = match step {
            StepRequest::Event {
                event_name,
                filters,
            } => StepDefinition {
                index,
                label: event_name.clone(),
                criteria: StepCriteria::Event(EventPredicate {
                    event_name: event_name.clone(),
                    filters: filters.clone(),
                }),
            },
            StepRequest::Action { action_id } => match resolver.resolve(action_id).await? {
                Some(action) => StepDefinition {
                    index,
                    label: action.name,
                    criteria: StepCriteria::Action {
                        action_id: action_id.clone(),
                        predicates: action.predicates,
                    },
                },
                None if policy == ActionPolicy::Strict => {
                    return Err(DefinitionError::UnknownAction {
                        step_index: index,
                        action_id: action_id.clone(),
                    }
                    .into());
                }
                None => {
                    warn!(%action_id, step_index = index, "unknown action; step will match nothing");
                    StepDefinition {
                        index,
                        label: action_id.clone(),
                        criteria: StepCriteria::Action {
                            action_id: action_id.clone(),
                            predicates: Vec::new(),
                        },
                    }
                }
            },
        };
        steps.push(definition);
    }
    Ok(FunnelPlan::new(request.name.clone(), steps)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trichter_core::ActionDefinition;
    use trichter_store::MemoryActionResolver;

    fn request(steps: Vec<StepRequest>) -> FunnelRequest {
        FunnelRequest {
            name: "test".to_string(),
            steps,
        }
    }

    #[tokio::test]
    async fn empty_request_fails_fast() {
        let resolver = MemoryActionResolver::new();
        let err = compile_plan(&request(vec![]), &resolver, ActionPolicy::Lenient)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FunnelError::Definition(DefinitionError::EmptyFunnel)
        ));
    }

    #[tokio::test]
    async fn action_steps_resolve_to_predicates_and_display_name() {
        let resolver = MemoryActionResolver::new();
        resolver.define(ActionDefinition {
            id: "a1".to_string(),
            name: "sign up".to_string(),
            predicates: vec![EventPredicate::named("sign up")],
        });

        let plan = compile_plan(
            &request(vec![StepRequest::Action {
                action_id: "a1".to_string(),
            }]),
            &resolver,
            ActionPolicy::Strict,
        )
        .await
        .unwrap();

        assert_eq!(plan.steps()[0].label, "sign up");
        match &plan.steps()[0].criteria {
            StepCriteria::Action { predicates, .. } => assert_eq!(predicates.len(), 1),
            other => panic!("expected action criteria, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_action_strict_vs_lenient() {
        let resolver = MemoryActionResolver::new();
        let req = request(vec![StepRequest::Action {
            action_id: "missing".to_string(),
        }]);

        let err = compile_plan(&req, &resolver, ActionPolicy::Strict)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FunnelError::Definition(DefinitionError::UnknownAction { .. })
        ));

        let plan = compile_plan(&req, &resolver, ActionPolicy::Lenient)
            .await
            .unwrap();
        match &plan.steps()[0].criteria {
            StepCriteria::Action { predicates, .. } => assert!(predicates.is_empty()),
            other => panic!("expected action criteria, got {other:?}"),
        }
    }
}

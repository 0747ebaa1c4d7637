//! Common error types used across all Trichter crates

use thiserror::Error;

/// Errors raised while validating or compiling a funnel definition.
///
/// These are reported before any scanning begins; a funnel run never starts
/// with an invalid plan.
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("funnel must define at least one step")]
    EmptyFunnel,

    #[error("step {step_index} references unknown action: {action_id}")]
    UnknownAction { step_index: usize, action_id: String },
}

//! Run-level error type for the funnel engine

use thiserror::Error;
use trichter_core::DefinitionError;
use trichter_store::StoreError;

/// Why a funnel run failed. Distinct from a legitimately empty funnel:
/// zero counts at every step are valid data, never an error.
#[derive(Error, Debug)]
pub enum FunnelError {
    #[error("invalid funnel definition: {0}")]
    Definition(#[from] DefinitionError),

    #[error("event store error: {0}")]
    Store(#[from] StoreError),

    #[error("scan worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

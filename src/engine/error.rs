use thiserror::Error;

use crate::projects::ProjectStoreError;
use crate::store::StoreError;

/// Errors surfaced by engine operations.
///
/// None of these are fatal to the process; failures stay local to one
/// chat/agent.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Projects(#[from] ProjectStoreError),

    #[error("unknown project bookmark: {0}")]
    UnknownBookmark(String),
}

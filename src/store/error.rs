use thiserror::Error;

use crate::store::ids::{AgentId, ChatId};

/// Errors from conversation-graph operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("chat {0} not found")]
    ChatNotFound(ChatId),

    #[error("agent {0} already exists")]
    DuplicateAgent(AgentId),

    #[error("cannot close the last remaining agent")]
    LastAgent,
}

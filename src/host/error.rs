use thiserror::Error;

/// Errors from session host commands.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("agent binary not found: {0}")]
    BinaryNotFound(String),

    #[error("failed to spawn agent process: {0}")]
    SpawnFailed(String),

    #[error("no live session for agent {0}")]
    NoLiveSession(String),

    #[error("host transport error: {0}")]
    Transport(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

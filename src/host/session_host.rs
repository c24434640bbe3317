//! Command interface to the external session host.
//!
//! The host owns the actual CLI processes; this crate only issues lifecycle
//! commands and consumes the tagged event stream. Starting a session does not
//! guarantee liveness — only the host's `sessionId` acknowledgment event does.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::host::error::HostError;
use crate::store::AgentId;

/// Options for starting a new CLI session.
#[derive(Debug, Clone)]
pub struct StartSessionOptions {
    pub agent_id: AgentId,
    pub prompt: String,
    pub project_path: Option<PathBuf>,
    pub model: Option<String>,
}

impl StartSessionOptions {
    pub fn new(agent_id: AgentId, prompt: impl Into<String>) -> Self {
        Self {
            agent_id,
            prompt: prompt.into(),
            project_path: None,
            model: None,
        }
    }

    pub fn with_project_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_path = Some(path.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Options for sending a follow-up message to an existing session.
#[derive(Debug, Clone)]
pub struct SendMessageOptions {
    pub agent_id: AgentId,
    pub prompt: String,
}

impl SendMessageOptions {
    pub fn new(agent_id: AgentId, prompt: impl Into<String>) -> Self {
        Self {
            agent_id,
            prompt: prompt.into(),
        }
    }
}

/// Lifecycle commands for external CLI sessions.
///
/// All commands are request/response and may fail; failures are surfaced to
/// the originating chat, never fatal to the process. `stop_session` is
/// idempotent and fails only on transport errors.
#[async_trait]
pub trait SessionHost: Send + Sync {
    /// Spawn a session for the agent. A session id is not known until the
    /// host emits its `sessionId` event.
    async fn start_session(&self, options: StartSessionOptions) -> Result<(), HostError>;

    /// Send a follow-up prompt. Callers check liveness first; the host fails
    /// with [`HostError::NoLiveSession`] otherwise.
    async fn send_message(&self, options: SendMessageOptions) -> Result<(), HostError>;

    /// Stop the agent's session. The host may keep emitting a few events
    /// after this returns.
    async fn stop_session(&self, agent_id: &AgentId) -> Result<(), HostError>;
}

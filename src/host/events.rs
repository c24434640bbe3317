//! The tagged event stream emitted by the session host.
//!
//! A single ordered channel carries events from every live session; each
//! event is tagged with the originating agent id and serializes as
//! `{ "type": "streamChunk", "agent_id": "...", "text": "..." }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{AgentId, ToolUseId};

/// Unified event type emitted by the session host for all agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CliEvent {
    /// Session initialized — the host's liveness acknowledgment.
    #[serde(rename = "sessionId")]
    SessionId {
        agent_id: AgentId,
        session_id: String,
    },

    /// Partial streaming text (accumulated across deltas, not a delta).
    #[serde(rename = "streamChunk")]
    StreamChunk { agent_id: AgentId, text: String },

    /// Final complete message text for a turn.
    #[serde(rename = "messageComplete")]
    MessageComplete { agent_id: AgentId, text: String },

    /// Model information reported by the session.
    #[serde(rename = "modelInfo")]
    ModelInfo { agent_id: AgentId, model: String },

    /// Token usage and cost totals.
    #[serde(rename = "usageInfo")]
    UsageInfo {
        agent_id: AgentId,
        input_tokens: u64,
        output_tokens: u64,
        cost_usd: f64,
    },

    /// Tool invocation started.
    #[serde(rename = "toolUse")]
    ToolUse {
        agent_id: AgentId,
        tool_use_id: ToolUseId,
        tool_name: String,
        tool_input: Value,
    },

    /// Tool invocation finished.
    #[serde(rename = "toolResult")]
    ToolResult {
        agent_id: AgentId,
        tool_use_id: ToolUseId,
        output_preview: String,
        is_error: bool,
    },

    /// One turn completed — process still alive, awaiting input.
    #[serde(rename = "turnComplete")]
    TurnComplete { agent_id: AgentId },

    /// The external process exited (naturally or killed).
    #[serde(rename = "processExited")]
    ProcessExited {
        agent_id: AgentId,
        exit_code: Option<i32>,
    },

    /// Host-reported error: stderr output, parse failure, or spawn failure.
    #[serde(rename = "error")]
    Error { agent_id: AgentId, message: String },
}

impl CliEvent {
    /// The originating agent. Every event carries one; routing keys on it
    /// before any shared state is touched.
    pub fn agent_id(&self) -> &AgentId {
        match self {
            CliEvent::SessionId { agent_id, .. }
            | CliEvent::StreamChunk { agent_id, .. }
            | CliEvent::MessageComplete { agent_id, .. }
            | CliEvent::ModelInfo { agent_id, .. }
            | CliEvent::UsageInfo { agent_id, .. }
            | CliEvent::ToolUse { agent_id, .. }
            | CliEvent::ToolResult { agent_id, .. }
            | CliEvent::TurnComplete { agent_id, .. }
            | CliEvent::ProcessExited { agent_id, .. }
            | CliEvent::Error { agent_id, .. } => agent_id,
        }
    }

    /// Human-readable event type name for logging.
    pub fn event_type_name(&self) -> &'static str {
        match self {
            CliEvent::SessionId { .. } => "sessionId",
            CliEvent::StreamChunk { .. } => "streamChunk",
            CliEvent::MessageComplete { .. } => "messageComplete",
            CliEvent::ModelInfo { .. } => "modelInfo",
            CliEvent::UsageInfo { .. } => "usageInfo",
            CliEvent::ToolUse { .. } => "toolUse",
            CliEvent::ToolResult { .. } => "toolResult",
            CliEvent::TurnComplete { .. } => "turnComplete",
            CliEvent::ProcessExited { .. } => "processExited",
            CliEvent::Error { .. } => "error",
        }
    }
}

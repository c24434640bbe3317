//! Internal messages that re-enter the engine loop.
//!
//! Fire-and-forget continuations (async command acknowledgments, the
//! tool-banner clear timer) never mutate state from their own tasks; they
//! send one of these back into the single-threaded loop instead.

use crate::store::{AgentId, ToolUseId};

#[derive(Debug, Clone)]
pub enum EngineMsg {
    /// A start/send/stop command was rejected by the session host.
    CommandFailed { agent_id: AgentId, message: String },

    /// The delayed tool-banner clear timer elapsed for this invocation.
    ToolClearElapsed { tool_use_id: ToolUseId },
}

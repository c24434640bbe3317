//! Identifier newtypes for the conversation graph.
//!
//! Ids that the engine allocates itself (`AgentId`, `ChatId`) are uuid-v4
//! strings; ids that originate at the session host boundary (`ToolUseId`)
//! are opaque strings carried through unchanged.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved id of the default workspace agent, present from bootstrap.
pub const WORKSPACE_AGENT_ID: &str = "workspace";

/// Stable, opaque identifier for an agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Allocate a fresh agent id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The reserved workspace agent id.
    pub fn workspace() -> Self {
        Self(WORKSPACE_AGENT_ID.to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_workspace(&self) -> bool {
        self.0 == WORKSPACE_AGENT_ID
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a chat thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a single message within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-assigned identifier pairing a tool invocation with its result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolUseId(String);

impl ToolUseId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ToolUseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_agent_ids_are_unique() {
        assert_ne!(AgentId::new(), AgentId::new());
    }

    #[test]
    fn workspace_id_is_reserved() {
        let id = AgentId::workspace();
        assert!(id.is_workspace());
        assert_eq!(id.as_str(), WORKSPACE_AGENT_ID);
        assert!(!AgentId::new().is_workspace());
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = AgentId::from_string("abc-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc-123\"");
        let back: AgentId = serde_json::from_str("\"abc-123\"").unwrap();
        assert_eq!(back, id);
    }
}

//! Ephemeral presentation flags, distinct from durable message history.
//!
//! `thinking` and the tool banner are global (they describe the rendered
//! chat); errors are buffered per agent so a failure delivered while an
//! agent is backgrounded is still there when it regains focus.

use std::collections::HashMap;

use crate::store::{AgentId, ToolActivity};

#[derive(Debug, Default)]
pub struct UiState {
    /// The rendered chat is waiting on assistant output.
    pub thinking: bool,
    /// Tool invocation currently shown in the activity banner.
    pub tool_activity: Option<ToolActivity>,
    errors: HashMap<AgentId, String>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset flags that must never leak across an agent focus change.
    /// Buffered errors survive; they belong to their agent.
    pub fn reset_ephemeral(&mut self) {
        self.thinking = false;
        self.tool_activity = None;
    }

    pub fn set_error(&mut self, agent_id: AgentId, message: impl Into<String>) {
        self.errors.insert(agent_id, message.into());
    }

    pub fn clear_error(&mut self, agent_id: &AgentId) {
        self.errors.remove(agent_id);
    }

    pub fn error_for(&self, agent_id: &AgentId) -> Option<&str> {
        self.errors.get(agent_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_buffered_per_agent() {
        let mut ui = UiState::new();
        let a = AgentId::from_string("a");
        let b = AgentId::from_string("b");

        ui.set_error(a.clone(), "boom");
        assert_eq!(ui.error_for(&a), Some("boom"));
        assert_eq!(ui.error_for(&b), None);

        ui.clear_error(&a);
        assert_eq!(ui.error_for(&a), None);
    }

    #[test]
    fn reset_keeps_buffered_errors() {
        let mut ui = UiState::new();
        let a = AgentId::from_string("a");
        ui.thinking = true;
        ui.set_error(a.clone(), "boom");

        ui.reset_ephemeral();
        assert!(!ui.thinking);
        assert!(ui.tool_activity.is_none());
        assert_eq!(ui.error_for(&a), Some("boom"));
    }
}

//! Session liveness registry.
//!
//! Tracks, per agent, whether an external CLI session is currently alive.
//! Dead-by-default: an agent is only marked alive once the host acknowledges
//! a session with a session-identifier event, never merely because a start
//! command was issued.

use std::collections::HashSet;

use crate::store::ids::AgentId;

/// Per-agent liveness flags. At most one session per agent, so a set of
/// agent ids is the whole state.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    alive: HashSet<AgentId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_alive(&self, agent_id: &AgentId) -> bool {
        self.alive.contains(agent_id)
    }

    pub fn mark_alive(&mut self, agent_id: AgentId) {
        self.alive.insert(agent_id);
    }

    pub fn mark_dead(&mut self, agent_id: &AgentId) {
        self.alive.remove(agent_id);
    }
}

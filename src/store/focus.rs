//! Focus state: the single globally active agent and, per agent, the chat
//! currently bound to that agent's live output.
//!
//! The globally rendered chat is derived: `active_chat_by_agent[active_agent]`.
//! Only [`ConversationStore`](crate::store::ConversationStore) mutates this
//! tracker, so focus changes stay atomic with graph changes.

use std::collections::HashMap;

use crate::store::ids::{AgentId, ChatId};

#[derive(Debug, Default)]
pub struct FocusTracker {
    active_agent: Option<AgentId>,
    active_chat_by_agent: HashMap<AgentId, ChatId>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The globally focused agent, if any agent exists yet.
    pub fn active_agent(&self) -> Option<&AgentId> {
        self.active_agent.as_ref()
    }

    /// The chat bound to an agent's live output.
    pub fn active_chat(&self, agent_id: &AgentId) -> Option<&ChatId> {
        self.active_chat_by_agent.get(agent_id)
    }

    /// The chat currently rendered: the active chat of the active agent.
    pub fn rendered_chat(&self) -> Option<&ChatId> {
        self.active_agent
            .as_ref()
            .and_then(|agent| self.active_chat_by_agent.get(agent))
    }

    pub fn is_rendered(&self, chat_id: &ChatId) -> bool {
        self.rendered_chat() == Some(chat_id)
    }

    pub fn is_focused(&self, agent_id: &AgentId) -> bool {
        self.active_agent.as_ref() == Some(agent_id)
    }

    pub(crate) fn set_active_agent(&mut self, agent_id: AgentId) {
        self.active_agent = Some(agent_id);
    }

    pub(crate) fn set_active_chat(&mut self, agent_id: AgentId, chat_id: ChatId) {
        self.active_chat_by_agent.insert(agent_id, chat_id);
    }

    pub(crate) fn forget_agent(&mut self, agent_id: &AgentId) {
        self.active_chat_by_agent.remove(agent_id);
        if self.active_agent.as_ref() == Some(agent_id) {
            self.active_agent = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_chat_follows_active_agent() {
        let mut focus = FocusTracker::new();
        let a = AgentId::new();
        let b = AgentId::new();
        let chat_a = ChatId::new();
        let chat_b = ChatId::new();

        focus.set_active_chat(a.clone(), chat_a.clone());
        focus.set_active_chat(b.clone(), chat_b.clone());

        assert_eq!(focus.rendered_chat(), None);

        focus.set_active_agent(a.clone());
        assert_eq!(focus.rendered_chat(), Some(&chat_a));
        assert!(focus.is_rendered(&chat_a));
        assert!(!focus.is_rendered(&chat_b));

        focus.set_active_agent(b);
        assert_eq!(focus.rendered_chat(), Some(&chat_b));
    }

    #[test]
    fn forget_agent_clears_focus() {
        let mut focus = FocusTracker::new();
        let a = AgentId::new();
        focus.set_active_chat(a.clone(), ChatId::new());
        focus.set_active_agent(a.clone());

        focus.forget_agent(&a);
        assert_eq!(focus.active_agent(), None);
        assert_eq!(focus.rendered_chat(), None);
    }
}

//! Conversation store: the single owner of the agent/chat/message graph.
//!
//! All mutation goes through this type. The event router mutates message
//! history exclusively via the `apply_*`/`append_*`/`close_*` methods below
//! and never holds a competing copy of the truth; focus changes go through
//! the embedded [`FocusTracker`] so graph and focus updates are atomic.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::error::StoreError;
use crate::store::focus::FocusTracker;
use crate::store::ids::{AgentId, ChatId, MessageId, ToolUseId};
use crate::store::message::{Message, ToolActivity};

const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// An isolated workspace bound to one project folder and at most one live
/// external session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub project_path: PathBuf,
    /// Sidebar card expansion flag.
    pub expanded: bool,
    /// Model reported by the host for the current session, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Latest token/cost totals reported by the host.
    #[serde(default)]
    pub usage: UsageTotals,
}

/// Token and cost totals as last reported by the session host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

/// An ordered conversation thread owned by exactly one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub agent_id: AgentId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ConversationStore {
    /// Insertion-ordered; "first remaining agent" on close means first here.
    agents: Vec<Agent>,
    chats: Vec<Chat>,
    messages: HashMap<ChatId, Vec<Message>>,
    focus: FocusTracker,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Read access ──

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, agent_id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| &a.id == agent_id)
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn chat(&self, chat_id: &ChatId) -> Option<&Chat> {
        self.chats.iter().find(|c| &c.id == chat_id)
    }

    pub fn chats_for(&self, agent_id: &AgentId) -> impl Iterator<Item = &Chat> {
        let agent_id = agent_id.clone();
        self.chats.iter().filter(move |c| c.agent_id == agent_id)
    }

    /// The agent owning a chat.
    pub fn chat_owner(&self, chat_id: &ChatId) -> Option<&AgentId> {
        self.chat(chat_id).map(|c| &c.agent_id)
    }

    pub fn messages(&self, chat_id: &ChatId) -> &[Message] {
        self.messages.get(chat_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn focus(&self) -> &FocusTracker {
        &self.focus
    }

    // ── Agent lifecycle ──

    /// Add an agent under a caller-supplied id (workspace bootstrap, reopening
    /// a bookmark). Creates the agent's first chat and focuses both.
    pub fn add_agent(
        &mut self,
        agent_id: AgentId,
        name: impl Into<String>,
        project_path: PathBuf,
    ) -> Result<ChatId, StoreError> {
        if self.agent(&agent_id).is_some() {
            return Err(StoreError::DuplicateAgent(agent_id));
        }

        self.agents.push(Agent {
            id: agent_id.clone(),
            name: name.into(),
            project_path,
            expanded: false,
            model: None,
            usage: UsageTotals::default(),
        });

        let chat_id = self.new_chat(agent_id.clone());
        self.focus.set_active_agent(agent_id);
        Ok(chat_id)
    }

    /// Allocate a fresh agent with one default chat; the new agent becomes
    /// the globally active agent and its chat the rendered chat.
    pub fn create_agent(&mut self, name: impl Into<String>, project_path: PathBuf) -> AgentId {
        let agent_id = AgentId::new();
        // Fresh uuid cannot collide with an existing agent.
        let _ = self.add_agent(agent_id.clone(), name, project_path);
        agent_id
    }

    /// Remove an agent together with all its chats and messages.
    ///
    /// Rejected for the last remaining agent. If the removed agent was the
    /// focused one, focus moves to the first remaining agent and its
    /// last-known active chat.
    pub fn close_agent(&mut self, agent_id: &AgentId) -> Result<(), StoreError> {
        if self.agent(agent_id).is_none() {
            return Err(StoreError::AgentNotFound(agent_id.clone()));
        }
        if self.agents.len() <= 1 {
            return Err(StoreError::LastAgent);
        }

        let was_focused = self.focus.is_focused(agent_id);

        self.agents.retain(|a| &a.id != agent_id);
        let removed: Vec<ChatId> = self
            .chats
            .iter()
            .filter(|c| &c.agent_id == agent_id)
            .map(|c| c.id.clone())
            .collect();
        self.chats.retain(|c| &c.agent_id != agent_id);
        for chat_id in removed {
            self.messages.remove(&chat_id);
        }
        self.focus.forget_agent(agent_id);

        if was_focused {
            // Deterministic fallback: first agent in insertion order.
            let next = self.agents[0].id.clone();
            if self.focus.active_chat(&next).is_none() {
                let chat_id = self.chats_for(&next).next().map(|chat| chat.id.clone());
                if let Some(chat_id) = chat_id {
                    self.focus.set_active_chat(next.clone(), chat_id);
                }
            }
            self.focus.set_active_agent(next);
        }

        Ok(())
    }

    pub fn toggle_expanded(&mut self, agent_id: &AgentId) -> Result<(), StoreError> {
        let agent = self
            .agents
            .iter_mut()
            .find(|a| &a.id == agent_id)
            .ok_or_else(|| StoreError::AgentNotFound(agent_id.clone()))?;
        agent.expanded = !agent.expanded;
        Ok(())
    }

    // ── Chat lifecycle ──

    /// Append a new empty chat owned by `agent_id` and make it that agent's
    /// active chat. If the agent is focused the new chat becomes the rendered
    /// chat (derived through the focus tracker).
    pub fn create_chat(&mut self, agent_id: &AgentId) -> Result<ChatId, StoreError> {
        if self.agent(agent_id).is_none() {
            return Err(StoreError::AgentNotFound(agent_id.clone()));
        }
        Ok(self.new_chat(agent_id.clone()))
    }

    fn new_chat(&mut self, agent_id: AgentId) -> ChatId {
        let chat_id = ChatId::new();
        self.chats.push(Chat {
            id: chat_id.clone(),
            agent_id: agent_id.clone(),
            title: DEFAULT_CHAT_TITLE.to_string(),
            created_at: Utc::now(),
        });
        self.messages.insert(chat_id.clone(), Vec::new());
        self.focus.set_active_chat(agent_id, chat_id.clone());
        chat_id
    }

    /// Bind the chat's owner agent to this chat. Never changes agent focus;
    /// only mutates focus mappings, never message content.
    pub fn switch_chat(&mut self, chat_id: &ChatId) -> Result<AgentId, StoreError> {
        let owner = self
            .chat_owner(chat_id)
            .cloned()
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.clone()))?;
        self.focus.set_active_chat(owner.clone(), chat_id.clone());
        Ok(owner)
    }

    /// Move global focus to an agent. Returns `false` (no-op) when already
    /// focused. Ephemeral flag resets are composed by the caller.
    pub fn switch_agent(&mut self, agent_id: &AgentId) -> Result<bool, StoreError> {
        if self.agent(agent_id).is_none() {
            return Err(StoreError::AgentNotFound(agent_id.clone()));
        }
        if self.focus.is_focused(agent_id) {
            return Ok(false);
        }
        self.focus.set_active_agent(agent_id.clone());
        Ok(true)
    }

    /// Drop a chat's message history in place. The chat itself survives.
    pub fn clear_chat(&mut self, chat_id: &ChatId) -> Result<(), StoreError> {
        let messages = self
            .messages
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.clone()))?;
        messages.clear();
        Ok(())
    }

    // ── Message mutation ──

    pub fn append_user_message(
        &mut self,
        chat_id: &ChatId,
        text: impl Into<String>,
    ) -> Result<MessageId, StoreError> {
        let messages = self
            .messages
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.clone()))?;
        let message = Message::user(text);
        let id = message.id;
        messages.push(message);
        Ok(id)
    }

    /// Streaming chunk: replace the streaming tail's text, or start a new
    /// streaming assistant message. Chunks carry accumulated text, so this
    /// replaces rather than concatenates. At most one streaming message can
    /// exist per chat, always at the tail.
    pub fn apply_stream_chunk(
        &mut self,
        chat_id: &ChatId,
        text: impl Into<String>,
    ) -> Result<(), StoreError> {
        let messages = self
            .messages
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.clone()))?;
        match messages.last_mut() {
            Some(last) if last.is_streaming_assistant() => last.text = text.into(),
            _ => messages.push(Message::streaming_assistant(text)),
        }
        Ok(())
    }

    /// Final turn text: finalize the streaming tail with this text, or append
    /// a new already-final assistant message.
    pub fn apply_message_complete(
        &mut self,
        chat_id: &ChatId,
        text: impl Into<String>,
    ) -> Result<(), StoreError> {
        let messages = self
            .messages
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.clone()))?;
        match messages.last_mut() {
            Some(last) if last.is_streaming_assistant() => {
                last.text = text.into();
                last.finalize();
            }
            _ => messages.push(Message::assistant(text)),
        }
        Ok(())
    }

    /// Attach an open tool activity to the tail assistant message. Returns
    /// `false` when the tail is not an assistant message (activity dropped).
    pub fn append_tool_use(
        &mut self,
        chat_id: &ChatId,
        activity: ToolActivity,
    ) -> Result<bool, StoreError> {
        let messages = self
            .messages
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.clone()))?;
        match messages.last_mut() {
            Some(last) if last.role == crate::store::message::Role::Assistant => {
                last.tools.push(activity);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Close the matching open tool activity in the tail assistant message.
    /// A result with no matching open invocation is a no-op; returns whether
    /// anything was closed.
    pub fn close_tool_result(
        &mut self,
        chat_id: &ChatId,
        tool_use_id: &ToolUseId,
        output: impl Into<String>,
        is_error: bool,
    ) -> Result<bool, StoreError> {
        let messages = self
            .messages
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.clone()))?;
        let Some(last) = messages.last_mut() else {
            return Ok(false);
        };
        if last.role != crate::store::message::Role::Assistant {
            return Ok(false);
        }
        match last
            .tools
            .iter_mut()
            .find(|t| &t.tool_use_id == tool_use_id && t.is_open())
        {
            Some(activity) => {
                activity.close(output, is_error);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Finalize a streaming tail without altering its text. Returns whether
    /// a message was finalized.
    pub fn finalize_streaming_tail(&mut self, chat_id: &ChatId) -> Result<bool, StoreError> {
        let messages = self
            .messages
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.clone()))?;
        match messages.last_mut() {
            Some(last) if last.is_streaming_assistant() => {
                last.finalize();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // ── Per-agent host metadata ──

    pub fn record_model(&mut self, agent_id: &AgentId, model: impl Into<String>) {
        if let Some(agent) = self.agents.iter_mut().find(|a| &a.id == agent_id) {
            agent.model = Some(model.into());
        }
    }

    pub fn record_usage(&mut self, agent_id: &AgentId, usage: UsageTotals) {
        if let Some(agent) = self.agents.iter_mut().find(|a| &a.id == agent_id) {
            agent.usage = usage;
        }
    }
}

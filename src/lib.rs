//! Maestro: conversation orchestration for CLI-agent chat frontends.
//!
//! A single [`Engine`] owns the entity graph (agents, chats, messages), the
//! session liveness registry, and the focus-gated ephemeral UI state, and
//! drives them from one cooperative loop fed by user [`Command`]s and the
//! tagged event stream of a [`SessionHost`].

pub mod engine;
pub mod host;
pub mod projects;
pub mod router;
pub mod store;
pub mod util;

pub use engine::{Command, Engine, EngineError, EngineHandle};
pub use host::{CliEvent, HostError, SendMessageOptions, SessionHost, StartSessionOptions};
pub use projects::{JsonProjectStore, ProjectBookmark, ProjectEntry, ProjectStore};
pub use router::{EventRouter, UiState, TOOL_CLEAR_DELAY};
pub use store::{
    Agent, AgentId, Chat, ChatId, ConversationStore, Message, MessageId, Role, SessionRegistry,
    StoreError, ToolActivity, ToolUseId,
};

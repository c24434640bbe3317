pub mod conversation;
pub mod error;
pub mod focus;
pub mod ids;
pub mod message;
pub mod registry;

pub use conversation::{Agent, Chat, ConversationStore, UsageTotals};
pub use error::StoreError;
pub use focus::FocusTracker;
pub use ids::{AgentId, ChatId, MessageId, ToolUseId, WORKSPACE_AGENT_ID};
pub use message::{Message, Role, ToolActivity};
pub use registry::SessionRegistry;

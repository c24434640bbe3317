//! Message and tool-activity records owned by a chat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::ids::{MessageId, ToolUseId};

/// Roles in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One tool invocation-and-result pair performed during an assistant turn.
///
/// An activity is open until a matching result event closes it by attaching
/// `result` and `is_error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolActivity {
    pub tool_use_id: ToolUseId,
    pub tool_name: String,
    pub tool_input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolActivity {
    pub fn open(tool_use_id: ToolUseId, tool_name: impl Into<String>, tool_input: Value) -> Self {
        Self {
            tool_use_id,
            tool_name: tool_name.into(),
            tool_input,
            result: None,
            is_error: false,
        }
    }

    /// Attach the result, closing the activity.
    pub fn close(&mut self, result: impl Into<String>, is_error: bool) {
        self.result = Some(result.into());
        self.is_error = is_error;
    }

    pub fn is_open(&self) -> bool {
        self.result.is_none()
    }
}

/// A single message in a chat, ordered by arrival.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Content still arriving; mutated in place until finalized.
    #[serde(default)]
    pub streaming: bool,
    /// Tool activities attached to this assistant message, in invocation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolActivity>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
            streaming: false,
            tools: Vec::new(),
        }
    }

    /// A finalized assistant message (no further mutation expected).
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
            streaming: false,
            tools: Vec::new(),
        }
    }

    /// An assistant message whose content is still arriving.
    pub fn streaming_assistant(text: impl Into<String>) -> Self {
        Self {
            streaming: true,
            ..Self::assistant(text)
        }
    }

    pub fn is_streaming_assistant(&self) -> bool {
        self.role == Role::Assistant && self.streaming
    }

    /// Mark the message complete without altering its text.
    pub fn finalize(&mut self) {
        self.streaming = false;
    }
}

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::role::Role;
use super::tool::ToolCall;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from an LLM
///
/// An assistant message requesting a function carries a `tool_call` and no content;
/// the tool result that answers it carries the matching `tool_call_id`.
pub struct Message {
    pub role: Role,
    pub created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn new(role: Role) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content: None,
            tool_call: None,
            tool_call_id: None,
        }
    }

    /// Create a new system message with the current timestamp
    pub fn system<S: Into<String>>(text: S) -> Self {
        Self::new(Role::System).with_text(text)
    }

    /// Create a new user message with the current timestamp
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self::new(Role::User).with_text(text)
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Self::new(Role::Assistant).with_text(text)
    }

    /// An assistant message that asks for a function to be called
    pub fn tool_request(call: ToolCall) -> Self {
        let mut message = Self::new(Role::Assistant);
        message.tool_call = Some(call);
        message
    }

    /// The result of a function call, linked to its request
    pub fn tool_result<I: Into<String>, S: Into<String>>(tool_call_id: I, text: S) -> Self {
        let mut message = Self::new(Role::Tool).with_text(text);
        message.tool_call_id = Some(tool_call_id.into());
        message
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.content = Some(text.into());
        self
    }

    /// The text of the message, or an empty string for pure tool requests
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn is_tool_request(&self) -> bool {
        self.tool_call.is_some()
    }
}

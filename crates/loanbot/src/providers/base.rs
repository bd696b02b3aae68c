use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::message::Message;
use crate::models::tool::Tool;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Why the model stopped producing output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The model answered directly
    Stop,
    /// The model asked for a function to be called
    ToolCalls,
    /// The output hit the token limit
    Length,
    /// The output was withheld by a content filter
    ContentFilter,
    Other(String),
}

impl StopReason {
    pub fn from_finish_reason(reason: &str) -> Self {
        match reason {
            "stop" => StopReason::Stop,
            "tool_calls" | "function_call" => StopReason::ToolCalls,
            "length" => StopReason::Length,
            "content_filter" => StopReason::ContentFilter,
            other => StopReason::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Stop => write!(f, "stop"),
            StopReason::ToolCalls => write!(f, "tool_calls"),
            StopReason::Length => write!(f, "length"),
            StopReason::ContentFilter => write!(f, "content_filter"),
            StopReason::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// One candidate message from the model, with the reason generation ended
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub message: Message,
    pub stop: StopReason,
    pub usage: Usage,
}

impl Completion {
    pub fn new(message: Message, stop: StopReason, usage: Usage) -> Self {
        Self {
            message,
            stop,
            usage,
        }
    }
}

/// Base trait for AI providers (OpenAI, Ollama, etc)
///
/// `messages` is the full transcript including the system message. An empty `tools`
/// slice means the model must answer without calling functions.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, messages: &[Message], tools: &[Tool]) -> Result<Completion>;
}

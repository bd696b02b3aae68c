use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};
use crate::providers::base::{Completion, Provider, StopReason, Usage};

/// A request as the mock provider saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub messages: Vec<Message>,
    pub tools: Vec<Tool>,
}

/// A mock provider that returns pre-configured responses for testing
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Result<Completion, String>>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Completion>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            requests: Arc::default(),
        }
    }

    /// Queue a transport failure as the next response
    pub fn push_error(&self, error: &str) {
        self.responses.lock().unwrap().push(Err(error.to_string()));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn answer(text: &str) -> Completion {
    Completion::new(Message::assistant(text), StopReason::Stop, Usage::default())
}

pub fn tool_call(id: &str, name: &str, arguments: &str) -> Completion {
    Completion::new(
        Message::tool_request(ToolCall::new(id, name, arguments)),
        StopReason::ToolCalls,
        Usage::default(),
    )
}

pub fn stopped(reason: StopReason) -> Completion {
    Completion::new(Message::assistant("partial"), reason, Usage::default())
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, messages: &[Message], tools: &[Tool]) -> Result<Completion> {
        self.requests.lock().unwrap().push(Recorded {
            messages: messages.to_vec(),
            tools: tools.to_vec(),
        });

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            Ok(answer(""))
        } else {
            responses.remove(0).map_err(|e| anyhow!(e))
        }
    }
}

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use loanbot::models::message::Message;
use loanbot::models::tool::Tool;
use loanbot::providers::base::{Completion, Provider, StopReason, Usage};

/// Scripted provider for the chat loop tests; the core crate's mock is only built for its own tests
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Completion>>>,
}

impl MockProvider {
    /// Each text becomes one model reply that stops normally
    pub fn new(texts: &[&str]) -> Self {
        let responses = texts
            .iter()
            .map(|text| Completion::new(Message::assistant(*text), StopReason::Stop, Usage::default()))
            .collect();
        Self {
            responses: Arc::new(Mutex::new(responses)),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, _messages: &[Message], _tools: &[Tool]) -> Result<Completion> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Running out of replies behaves like a refused answer
            Ok(Completion::new(
                Message::assistant(""),
                StopReason::ContentFilter,
                Usage::default(),
            ))
        } else {
            Ok(responses.remove(0))
        }
    }
}

use std::sync::Arc;

use crate::agent::{Agent, Assessment};
use crate::conversation::Conversation;
use crate::errors::AgentResult;
use crate::models::message::Message;

/// One borrower's conversation with a shared agent.
///
/// Queries against a session must not interleave; front ends hold a session behind a
/// lock or drive it from a single task.
pub struct Session {
    agent: Arc<Agent>,
    conversation: Conversation,
}

impl Session {
    pub fn new(agent: Arc<Agent>) -> Self {
        let conversation = agent.start_conversation();
        Self {
            agent,
            conversation,
        }
    }

    /// Resume from a persisted transcript
    pub fn restore(agent: Arc<Agent>, messages: Vec<Message>) -> AgentResult<Self> {
        let conversation = Conversation::restore(messages)?;
        Ok(Self {
            agent,
            conversation,
        })
    }

    pub async fn ask(&mut self, query: &str) -> AgentResult<String> {
        self.agent.answer(query, &mut self.conversation).await
    }

    pub async fn assess(&mut self, query: &str) -> AgentResult<Assessment> {
        self.agent.assess(query, &mut self.conversation).await
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }
}

//! Conversation state and the per-query scratchpad.
//!
//! The [`Conversation`] is the durable transcript of a session: one system message
//! followed by user questions and final answers. It only ever grows, and only the
//! agent appends to it. The [`Scratchpad`] holds the tool requests and results of a
//! single query and is dropped once that query is answered.
use serde::Serialize;

use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::role::Role;
use crate::prompt_template::load_builtin_prompt;

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation seeded with the system prompt
    pub fn new<S: Into<String>>(system_prompt: S) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Rebuild a conversation from a persisted transcript
    pub fn restore(messages: Vec<Message>) -> AgentResult<Self> {
        match messages.first() {
            Some(first) if first.role == Role::System => {}
            _ => {
                return Err(AgentError::InvalidInput(
                    "a transcript must start with the system message".to_string(),
                ))
            }
        }
        if messages.iter().skip(1).any(|m| m.role == Role::System) {
            return Err(AgentError::InvalidInput(
                "a transcript holds exactly one system message".to_string(),
            ));
        }
        Ok(Self { messages })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages after the system prompt
    pub fn history(&self) -> &[Message] {
        &self.messages[1..]
    }

    pub fn system_prompt(&self) -> &str {
        self.messages[0].text()
    }

    /// Monotonic version of the log; bumps on every append
    pub fn version(&self) -> usize {
        self.messages.len()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn push_user<S: Into<String>>(&mut self, text: S) {
        self.messages.push(Message::user(text));
    }

    pub(crate) fn push_assistant(&mut self, message: Message) {
        debug_assert_eq!(message.role, Role::Assistant);
        self.messages.push(message);
    }
}

/// Working memory for one query
#[derive(Debug, Default, Clone)]
pub struct Scratchpad {
    entries: Vec<Message>,
}

#[derive(Serialize)]
struct Step<'a> {
    tool: Option<&'a str>,
    arguments: Option<&'a str>,
    text: Option<&'a str>,
}

#[derive(Serialize)]
struct SynthesisContext<'a> {
    steps: Vec<Step<'a>>,
}

impl Scratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.entries.push(message);
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tool invocation rounds recorded so far
    pub fn rounds(&self) -> usize {
        self.entries.iter().filter(|m| m.is_tool_request()).count()
    }

    /// Condense the scratchpad into the instruction used for the final, tool-free answer
    pub fn digest(&self) -> AgentResult<Message> {
        let steps = self
            .entries
            .iter()
            .map(|entry| match &entry.tool_call {
                Some(call) => Step {
                    tool: Some(&call.name),
                    arguments: Some(&call.arguments),
                    text: None,
                },
                None => Step {
                    tool: None,
                    arguments: None,
                    text: Some(entry.text()),
                },
            })
            .collect();

        let text = load_builtin_prompt("synthesis.md", &SynthesisContext { steps })
            .map_err(|e| AgentError::Internal(e.to_string()))?;
        Ok(Message::assistant(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tool::ToolCall;

    #[test]
    fn test_new_conversation_has_system_message() {
        let conversation = Conversation::new("You are a loan assistant.");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert_eq!(conversation.system_prompt(), "You are a loan assistant.");
        assert!(conversation.history().is_empty());
    }

    #[test]
    fn test_append_bumps_version() {
        let mut conversation = Conversation::new("system");
        let before = conversation.version();
        conversation.push_user("What is my APR?");
        conversation.push_assistant(Message::assistant("Your APR is 6.25%."));
        assert_eq!(conversation.version(), before + 2);
        assert_eq!(conversation.history()[0].role, Role::User);
        assert_eq!(conversation.history()[1].text(), "Your APR is 6.25%.");
    }

    #[test]
    fn test_restore_validates_system_message() {
        let ok = Conversation::restore(vec![Message::system("s"), Message::user("hi")]);
        assert!(ok.is_ok());

        let missing = Conversation::restore(vec![Message::user("hi")]);
        assert!(matches!(missing, Err(AgentError::InvalidInput(_))));

        let duplicated = Conversation::restore(vec![Message::system("s"), Message::system("t")]);
        assert!(matches!(duplicated, Err(AgentError::InvalidInput(_))));

        assert!(Conversation::restore(Vec::new()).is_err());
    }

    #[test]
    fn test_scratchpad_rounds() {
        let mut scratchpad = Scratchpad::new();
        assert_eq!(scratchpad.rounds(), 0);
        scratchpad.push(Message::tool_request(ToolCall::new("1", "read_loan_parameters", "{}")));
        scratchpad.push(Message::tool_result("1", "The answer is {}."));
        assert_eq!(scratchpad.rounds(), 1);
        assert_eq!(scratchpad.len(), 2);
    }

    #[test]
    fn test_digest_lists_steps_in_order() {
        let mut scratchpad = Scratchpad::new();
        scratchpad.push(Message::tool_request(ToolCall::new(
            "1",
            "calculate_monthly_payment",
            r#"{"term": 12}"#,
        )));
        scratchpad.push(Message::tool_result("1", "The answer is 1032.8."));

        let digest = scratchpad.digest().unwrap();
        assert_eq!(digest.role, Role::Assistant);

        let text = digest.text();
        assert!(text.starts_with("To answer the question I will use these step by step instructions."));
        let call = text
            .find(r#"I will use the calculate_monthly_payment function to calculate the answer with arguments {"term": 12}."#)
            .unwrap();
        let result = text.find("The answer is 1032.8.").unwrap();
        let closing = text.find("Based on the above").unwrap();
        assert!(call < result && result < closing);
    }

    #[test]
    fn test_digest_of_empty_scratchpad() {
        let digest = Scratchpad::new().digest().unwrap();
        assert!(digest.text().contains("Based on the above"));
        assert!(!digest.text().contains("I will use the"));
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::conversation::{Conversation, Scratchpad};
use crate::errors::{AgentError, AgentResult};
use crate::loan::{LoanFacts, LoanSystem};
use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};
use crate::prompt_template::{load_builtin_prompt, load_prompt_file};
use crate::providers::base::{Completion, Provider, StopReason};
use crate::registry::ToolRegistry;

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 3;
pub const ASSISTANT_NAME: &str = "Loanbot";

/// When to stop calling tools and write the final answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPolicy {
    /// Tool rounds allowed before the answer is forced, even if the model wants more
    pub max_tool_rounds: usize,
}

impl Default for AgentPolicy {
    fn default() -> Self {
        Self {
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }
}

/// An answer together with whether the question was outside the assistant's domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub response: String,
    /// `None` when the classification request failed
    pub off_topic: Option<bool>,
}

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
}

#[derive(Serialize)]
struct SystemPromptContext {
    name: &'static str,
    tools: Vec<ToolInfo>,
}

#[derive(Serialize)]
struct ClassifyContext<'a> {
    query: &'a str,
}

/// Agent integrates a foundational LLM with the loan tools it can call
pub struct Agent {
    provider: Box<dyn Provider>,
    registry: ToolRegistry,
    system_prompt: String,
    policy: AgentPolicy,
}

impl Agent {
    /// Create a new Agent with the specified provider and tools
    pub fn new(provider: Box<dyn Provider>, registry: ToolRegistry) -> AgentResult<Self> {
        let system_prompt = load_builtin_prompt("system.md", &prompt_context(&registry))
            .map_err(|e| AgentError::Internal(e.to_string()))?;
        Ok(Self {
            provider,
            registry,
            system_prompt,
            policy: AgentPolicy::default(),
        })
    }

    /// An agent wired to the loan tools over `facts`
    pub fn for_loan(provider: Box<dyn Provider>, facts: Arc<LoanFacts>) -> AgentResult<Self> {
        let registry = ToolRegistry::new(vec![Box::new(LoanSystem::new(facts))])?;
        Self::new(provider, registry)
    }

    pub fn with_policy(mut self, policy: AgentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_system_prompt<S: Into<String>>(mut self, system_prompt: S) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Replace the system prompt with a template rendered from disk
    pub fn with_system_prompt_file(self, path: impl AsRef<Path>) -> AgentResult<Self> {
        let prompt = load_prompt_file(path.as_ref(), &prompt_context(&self.registry))
            .map_err(|e| AgentError::Internal(e.to_string()))?;
        Ok(self.with_system_prompt(prompt))
    }

    pub fn policy(&self) -> AgentPolicy {
        self.policy
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// A fresh conversation seeded with this agent's system prompt
    pub fn start_conversation(&self) -> Conversation {
        Conversation::new(self.system_prompt.clone())
    }

    /// Answer `query`, recording the question and the final answer in `conversation`.
    ///
    /// The model gets tool access for up to `max_tool_rounds` rounds. Afterwards a
    /// digest of those rounds is handed to one last, tool-free request that writes the
    /// answer. Intermediate tool traffic never reaches the conversation. On error the
    /// conversation keeps the question and nothing else.
    pub async fn answer(&self, query: &str, conversation: &mut Conversation) -> AgentResult<String> {
        if query.trim().is_empty() {
            return Err(AgentError::InvalidInput("query must not be empty".to_string()));
        }

        conversation.push_user(query);
        let mut scratchpad = Scratchpad::new();
        let tools = self.registry.tools();

        loop {
            let mut transcript = conversation.messages().to_vec();
            transcript.extend_from_slice(scratchpad.entries());

            let completion = self.complete(&transcript, &tools).await?;
            tracing::debug!(
                stop = %completion.stop,
                rounds = scratchpad.rounds(),
                "model round finished"
            );

            if completion.stop == StopReason::Stop
                || scratchpad.rounds() >= self.policy.max_tool_rounds
            {
                break;
            }

            match completion.stop {
                StopReason::ToolCalls => {
                    let call = completion.message.tool_call.ok_or_else(|| {
                        AgentError::binding("<none>", "the model requested a tool without naming it")
                    })?;
                    scratchpad.push(Message::tool_request(call.clone()));
                    let result = self.dispatch(&call).await?;
                    scratchpad.push(Message::tool_result(call.id, result));
                }
                other => return Err(AgentError::UnexpectedStopReason(other.to_string())),
            }
        }

        let digest = scratchpad.digest()?;
        tracing::info!(thought = digest.text(), "synthesizing final answer");

        let mut transcript = conversation.messages().to_vec();
        transcript.push(digest);
        let completion = self.complete(&transcript, &[]).await?;
        if completion.stop != StopReason::Stop {
            return Err(AgentError::UnexpectedStopReason(completion.stop.to_string()));
        }

        let text = completion
            .message
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or(AgentError::EmptyResponse)?;
        conversation.push_assistant(Message::assistant(text.clone()));
        Ok(text)
    }

    /// Answer `query` and classify whether it was off-topic.
    ///
    /// The answer is already part of the conversation once classification starts,
    /// so a failed classification leaves `off_topic` unknown instead of failing the query.
    pub async fn assess(
        &self,
        query: &str,
        conversation: &mut Conversation,
    ) -> AgentResult<Assessment> {
        let response = self.answer(query, conversation).await?;
        let off_topic = match self.classify(query).await {
            Ok(off_topic) => Some(off_topic),
            Err(err) => {
                tracing::warn!(error = %err, "off-topic classification failed");
                None
            }
        };
        Ok(Assessment {
            response,
            off_topic,
        })
    }

    /// Ask the model, without tools or history, whether `query` is outside the loan domain
    pub async fn classify(&self, query: &str) -> AgentResult<bool> {
        let instruction = load_builtin_prompt("classify.md", &ClassifyContext { query })
            .map_err(|e| AgentError::Internal(e.to_string()))?;
        let messages = vec![
            Message::system(self.system_prompt.clone()),
            Message::user(instruction),
        ];

        let completion = self.complete(&messages, &[]).await?;
        if completion.stop != StopReason::Stop {
            return Err(AgentError::UnexpectedStopReason(completion.stop.to_string()));
        }

        let verdict = completion.message.text().trim().to_lowercase();
        tracing::debug!(%verdict, "off-topic classification");
        Ok(verdict.starts_with("yes"))
    }

    /// Run one requested tool and describe its result for the scratchpad.
    ///
    /// Failures inside the tool become the description, so the model can explain them;
    /// unparseable arguments and unknown tools abort the query.
    async fn dispatch(&self, call: &ToolCall) -> AgentResult<String> {
        let arguments = call.parse_arguments()?;
        tracing::info!(tool = %call.name, %arguments, "calling tool");

        match self.registry.invoke(&call.name, arguments).await {
            Ok(value) => Ok(format!("The answer is {}.", describe(&value))),
            Err(err) if err.is_tool_failure() => {
                tracing::warn!(tool = %call.name, error = %err, "tool failed");
                Ok(format!("The {} function failed: {}.", call.name, err))
            }
            Err(err) => Err(err),
        }
    }

    async fn complete(&self, messages: &[Message], tools: &[Tool]) -> AgentResult<Completion> {
        self.provider.complete(messages, tools).await.map_err(|e| {
            tracing::error!(error = %e, "provider request failed");
            AgentError::Provider(format!("{:#}", e))
        })
    }
}

fn prompt_context(registry: &ToolRegistry) -> SystemPromptContext {
    SystemPromptContext {
        name: ASSISTANT_NAME,
        tools: registry
            .tools()
            .into_iter()
            .map(|tool| ToolInfo {
                name: tool.name,
                description: tool.description.trim().replace('\n', " "),
            })
            .collect(),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

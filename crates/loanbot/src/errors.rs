use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Could not bind arguments for {tool}: {reason}")]
    ArgumentBinding { tool: String, reason: String },

    #[error("Unexpected stop reason: {0}")]
    UnexpectedStopReason(String),

    #[error("Malformed loan record: {0}")]
    MalformedRecord(String),

    #[error("Loan record could not be loaded: {0}")]
    RecordUnavailable(String),

    #[error("Monthly payment is undefined: {0}")]
    DivisionUndefined(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Provider request failed: {0}")]
    Provider(String),

    #[error("The model returned an empty response")]
    EmptyResponse,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    pub fn binding<T: Into<String>, R: Into<String>>(tool: T, reason: R) -> Self {
        AgentError::ArgumentBinding {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Errors raised while a tool body runs. These are reported back to the model
    /// instead of aborting the query.
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            AgentError::DivisionUndefined(_)
                | AgentError::MalformedRecord(_)
                | AgentError::ToolExecution(_)
        )
    }
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        AgentError::Io(err.to_string())
    }
}

pub type AgentResult<T> = Result<T, AgentError>;

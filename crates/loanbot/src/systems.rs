use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::AgentResult;
use crate::models::tool::Tool;

/// A group of related tools the agent can pilot
#[async_trait]
pub trait System: Send + Sync {
    /// Get the name of the system
    fn name(&self) -> &str;

    /// Get the system description
    fn description(&self) -> &str;

    /// Get system instructions
    fn instructions(&self) -> &str;

    /// Get available tools
    fn tools(&self) -> &[Tool];

    /// Call one of this system's tools.
    ///
    /// The arguments have already been bound against the tool's declared parameters,
    /// so every parameter is present (possibly as its default).
    async fn call(&self, tool_name: &str, arguments: Map<String, Value>) -> AgentResult<Value>;
}

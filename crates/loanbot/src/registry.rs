//! Name-keyed lookup of every tool the agent may call.
//!
//! The registry is built once from the agent's systems and is immutable afterwards.
//! Bad names and duplicates are rejected while building it, so the only failures left
//! at call time are a name the model made up and arguments that do not bind.
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;
use crate::systems::System;

lazy_static::lazy_static! {
    static ref TOOL_NAME: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

pub fn is_valid_tool_name(name: &str) -> bool {
    TOOL_NAME.is_match(name)
}

pub struct ToolRegistry {
    systems: Vec<Box<dyn System>>,
    /// tool name -> (system index, tool index)
    index: HashMap<String, (usize, usize)>,
}

impl ToolRegistry {
    pub fn new(systems: Vec<Box<dyn System>>) -> AgentResult<Self> {
        let mut index = HashMap::new();
        for (system_idx, system) in systems.iter().enumerate() {
            for (tool_idx, tool) in system.tools().iter().enumerate() {
                if !is_valid_tool_name(&tool.name) {
                    return Err(AgentError::Internal(format!(
                        "tool name '{}' must match [a-zA-Z0-9_-]+",
                        tool.name
                    )));
                }
                if index
                    .insert(tool.name.clone(), (system_idx, tool_idx))
                    .is_some()
                {
                    return Err(AgentError::Internal(format!(
                        "duplicate tool name: {}",
                        tool.name
                    )));
                }
            }
        }
        Ok(Self { systems, index })
    }

    /// All tool descriptors, in registration order
    pub fn tools(&self) -> Vec<Tool> {
        self.systems
            .iter()
            .flat_map(|system| system.tools().iter().cloned())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn schema_for(&self, name: &str) -> AgentResult<&Tool> {
        self.resolve(name).map(|(_, tool)| tool)
    }

    /// Bind the arguments to the named tool and run it
    pub async fn invoke(&self, name: &str, arguments: Value) -> AgentResult<Value> {
        let (system, tool) = self.resolve(name)?;
        let bound = tool.bind(arguments)?;
        tracing::debug!(tool = name, system = system.name(), "invoking tool");
        system.call(name, bound).await
    }

    fn resolve(&self, name: &str) -> AgentResult<(&dyn System, &Tool)> {
        let (system_idx, tool_idx) = self
            .index
            .get(name)
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))?;
        let system = self.systems[*system_idx].as_ref();
        Ok((system, &system.tools()[*tool_idx]))
    }
}

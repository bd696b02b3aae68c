use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::{AgentError, AgentResult};

/// The semantic type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
}

impl ParamKind {
    fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            // integers are valid numbers, the model often drops the fraction
            ParamKind::Number => value.is_number(),
            // tools read integers as i64, so anything wider is out of range
            ParamKind::Integer => value.is_i64(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }
}

/// A single declared parameter of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    /// Filled in when the caller leaves the parameter out. `Value::Null` is a valid default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Parameter {
    /// A parameter the model must always supply
    pub fn required<N, D>(name: N, kind: ParamKind, description: D) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            default: None,
        }
    }

    /// A parameter that falls back to `default` when omitted
    pub fn optional<N, D>(name: N, kind: ParamKind, description: D, default: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            default: Some(default),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// A tool that can be used by a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// Parameters that the tool accepts
    pub parameters: Vec<Parameter>,
}

impl Tool {
    /// Create a new tool with the given name and description
    pub fn new<N, D>(name: N, description: D, parameters: Vec<Parameter>) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// JSON schema of the parameters, in the shape chat completion APIs expect
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut property = json!({
                "type": param.kind.as_str(),
                "description": param.description,
            });
            if let Some(default) = &param.default {
                if !default.is_null() {
                    property["default"] = default.clone();
                }
            }
            properties.insert(param.name.clone(), property);
            if param.is_required() {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Match parsed arguments against the declared parameters.
    ///
    /// Unknown or missing required arguments and type mismatches are binding errors;
    /// omitted optional arguments take their declared default.
    pub fn bind(&self, arguments: Value) -> AgentResult<Map<String, Value>> {
        let mut given = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(AgentError::binding(
                    &self.name,
                    format!("arguments must be an object, got {}", other),
                ))
            }
        };

        if let Some(unknown) = given
            .keys()
            .find(|key| !self.parameters.iter().any(|p| &p.name == *key))
        {
            return Err(AgentError::binding(
                &self.name,
                format!("unexpected argument `{}`", unknown),
            ));
        }

        let mut bound = Map::new();
        for param in &self.parameters {
            // an explicit null on an optional parameter means "use the default"
            let supplied = given
                .remove(&param.name)
                .filter(|value| !(value.is_null() && param.default.is_some()));
            match supplied {
                Some(value) => {
                    if !param.kind.accepts(&value) {
                        return Err(AgentError::binding(
                            &self.name,
                            format!(
                                "argument `{}` must be of type {}, got {}",
                                param.name,
                                param.kind.as_str(),
                                value
                            ),
                        ));
                    }
                    bound.insert(param.name.clone(), value);
                }
                None => match &param.default {
                    Some(default) => {
                        bound.insert(param.name.clone(), default.clone());
                    }
                    None => {
                        return Err(AgentError::binding(
                            &self.name,
                            format!("missing required argument `{}`", param.name),
                        ))
                    }
                },
            }
        }

        Ok(bound)
    }
}

/// A function call requested by the model
///
/// The arguments are kept exactly as the model produced them; turning them into
/// structured data is the agent's job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Identifier used to link the result back to this request
    pub id: String,
    /// The name of the tool to execute
    pub name: String,
    /// Raw argument payload
    pub arguments: String,
}

impl ToolCall {
    pub fn new<I, N, A>(id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the raw payload. An empty payload is the empty object.
    pub fn parse_arguments(&self) -> AgentResult<Value> {
        if self.arguments.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&self.arguments).map_err(|e| {
            AgentError::binding(
                &self.name,
                format!("could not parse arguments {}: {}", self.arguments, e),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment_tool() -> Tool {
        Tool::new(
            "calculate_monthly_payment",
            "Calculate a payment",
            vec![
                Parameter::required("amount", ParamKind::Number, "Principal"),
                Parameter::optional("term", ParamKind::Integer, "Months", json!(12)),
                Parameter::optional("note", ParamKind::String, "Free text", Value::Null),
            ],
        )
    }

    #[test]
    fn test_input_schema() {
        let schema = payment_tool().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["amount"]["type"], "number");
        assert_eq!(schema["properties"]["term"]["default"], 12);
        assert!(schema["properties"]["note"].get("default").is_none());
        assert_eq!(schema["required"], json!(["amount"]));
    }

    #[test]
    fn test_bind_fills_defaults() {
        let bound = payment_tool().bind(json!({"amount": 5000})).unwrap();
        assert_eq!(bound["amount"], json!(5000));
        assert_eq!(bound["term"], json!(12));
        assert_eq!(bound["note"], Value::Null);
    }

    #[test]
    fn test_bind_rejects_missing_required() {
        let err = payment_tool().bind(json!({"term": 24})).unwrap_err();
        assert!(matches!(err, AgentError::ArgumentBinding { .. }));
        assert!(err.to_string().contains("missing required argument `amount`"));
    }

    #[test]
    fn test_bind_rejects_extra_argument() {
        let err = payment_tool()
            .bind(json!({"amount": 1.0, "currency": "USD"}))
            .unwrap_err();
        assert!(err.to_string().contains("unexpected argument `currency`"));
    }

    #[test]
    fn test_bind_rejects_wrong_type() {
        let err = payment_tool()
            .bind(json!({"amount": "a lot"}))
            .unwrap_err();
        assert!(matches!(err, AgentError::ArgumentBinding { .. }));

        let err = payment_tool()
            .bind(json!({"amount": 1.0, "term": 12.5}))
            .unwrap_err();
        assert!(err.to_string().contains("`term` must be of type integer"));
    }

    #[test]
    fn test_bind_rejects_integer_out_of_range() {
        let err = payment_tool()
            .bind(json!({"amount": 1.0, "term": u64::MAX}))
            .unwrap_err();
        assert!(err.to_string().contains("`term` must be of type integer"));

        let bound = payment_tool()
            .bind(json!({"amount": 1.0, "term": i64::MAX}))
            .unwrap();
        assert_eq!(bound["term"].as_i64(), Some(i64::MAX));
    }

    #[test]
    fn test_bind_rejects_non_object() {
        let err = payment_tool().bind(json!([1, 2])).unwrap_err();
        assert!(matches!(err, AgentError::ArgumentBinding { .. }));
    }

    #[test]
    fn test_parse_arguments() {
        let call = ToolCall::new("1", "calculate_monthly_payment", r#"{"amount": 10}"#);
        assert_eq!(call.parse_arguments().unwrap(), json!({"amount": 10}));

        let empty = ToolCall::new("2", "read_loan_parameters", "");
        assert_eq!(empty.parse_arguments().unwrap(), json!({}));

        let broken = ToolCall::new("3", "read_loan_parameters", "{amount: ");
        assert!(matches!(
            broken.parse_arguments(),
            Err(AgentError::ArgumentBinding { .. })
        ));
    }
}

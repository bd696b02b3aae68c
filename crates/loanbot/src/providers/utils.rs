use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use super::base::{Completion, StopReason, Usage};
use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let mut converted = json!({
                "role": message.role.as_str(),
            });

            match (&message.tool_call, message.role) {
                (Some(call), _) => {
                    converted["content"] = Value::Null;
                    converted["tool_calls"] = json!([{
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments,
                        }
                    }]);
                }
                (None, Role::Tool) => {
                    converted["content"] = json!(message.text());
                    converted["tool_call_id"] = json!(message.tool_call_id);
                }
                (None, _) => {
                    converted["content"] = json!(message.text());
                }
            }

            converted
        })
        .collect()
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.input_schema(),
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to a completion
///
/// Accepts both `tool_calls` and the older single `function_call` shape. Only the
/// first requested call is kept; the agent runs one tool per round.
pub fn openai_response_to_completion(response: &Value) -> Result<Completion> {
    let choice = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .ok_or_else(|| anyhow!("No choices in response: {}", response))?;
    let original = &choice["message"];

    let stop = choice
        .get("finish_reason")
        .and_then(|v| v.as_str())
        .map(StopReason::from_finish_reason)
        .unwrap_or_else(|| StopReason::Other("missing".to_string()));

    let mut message = Message::assistant("");
    message.content = original
        .get("content")
        .and_then(|v| v.as_str())
        .map(String::from);

    if let Some(tool_calls) = original.get("tool_calls").and_then(|v| v.as_array()) {
        if tool_calls.len() > 1 {
            tracing::warn!(
                count = tool_calls.len(),
                "model requested several tool calls, only the first is used"
            );
        }
        if let Some(tool_call) = tool_calls.first() {
            message.tool_call = Some(ToolCall::new(
                tool_call["id"].as_str().unwrap_or_default(),
                tool_call["function"]["name"].as_str().unwrap_or_default(),
                tool_call["function"]["arguments"].as_str().unwrap_or_default(),
            ));
        }
    } else if let Some(function_call) = original.get("function_call").filter(|v| v.is_object()) {
        message.tool_call = Some(ToolCall::new(
            format!("call_{}", uuid::Uuid::new_v4().simple()),
            function_call["name"].as_str().unwrap_or_default(),
            function_call["arguments"].as_str().unwrap_or_default(),
        ));
    }

    Ok(Completion::new(message, stop, get_usage(response)))
}

pub fn get_usage(data: &Value) -> Usage {
    let usage = match data.get("usage") {
        Some(usage) => usage,
        None => return Usage::default(),
    };

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let output_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32)
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tool::{ParamKind, Parameter};

    #[test]
    fn test_messages_to_openai_spec() {
        let messages = vec![
            Message::system("You help with loans."),
            Message::user("What is my payment?"),
            Message::tool_request(ToolCall::new(
                "call_1",
                "calculate_monthly_payment",
                "{}",
            )),
            Message::tool_result("call_1", "The answer is 1032.8."),
            Message::assistant("Your payment is $1,032.80."),
        ];

        let spec = messages_to_openai_spec(&messages);

        assert_eq!(spec.len(), 5);
        assert_eq!(spec[0]["role"], "system");
        assert_eq!(spec[1]["content"], "What is my payment?");
        assert_eq!(spec[2]["role"], "assistant");
        assert!(spec[2]["content"].is_null());
        assert_eq!(spec[2]["tool_calls"][0]["function"]["name"], "calculate_monthly_payment");
        assert_eq!(spec[2]["tool_calls"][0]["function"]["arguments"], "{}");
        assert_eq!(spec[3]["role"], "tool");
        assert_eq!(spec[3]["tool_call_id"], spec[2]["tool_calls"][0]["id"]);
        assert_eq!(spec[4]["content"], "Your payment is $1,032.80.");
    }

    #[test]
    fn test_tools_to_openai_spec() -> Result<()> {
        let tool = Tool::new(
            "calculate_monthly_payment",
            "Calculate a payment",
            vec![Parameter::required("term", ParamKind::Integer, "Months")],
        );

        let spec = tools_to_openai_spec(&[tool])?;

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["type"], "function");
        assert_eq!(spec[0]["function"]["name"], "calculate_monthly_payment");
        assert_eq!(spec[0]["function"]["parameters"]["required"], json!(["term"]));
        Ok(())
    }

    #[test]
    fn test_tools_to_openai_spec_duplicate() {
        let tool = Tool::new("read_loan_parameters", "Read", Vec::new());
        let result = tools_to_openai_spec(&[tool.clone(), tool]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate tool name"));
    }

    #[test]
    fn test_response_with_tool_calls() -> Result<()> {
        let response = json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "read_loan_parameters",
                            "arguments": "{}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 20, "completion_tokens": 15}
        });

        let completion = openai_response_to_completion(&response)?;
        assert_eq!(completion.stop, StopReason::ToolCalls);
        assert!(completion.message.content.is_none());
        let call = completion.message.tool_call.unwrap();
        assert_eq!(call.id, "call_123");
        assert_eq!(call.name, "read_loan_parameters");
        assert_eq!(call.arguments, "{}");
        assert_eq!(completion.usage.total_tokens, Some(35));
        Ok(())
    }

    #[test]
    fn test_response_with_legacy_function_call() -> Result<()> {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": {
                        "name": "calculate_monthly_payment",
                        "arguments": "{\"term\": 24}"
                    }
                },
                "finish_reason": "function_call"
            }]
        });

        let completion = openai_response_to_completion(&response)?;
        assert_eq!(completion.stop, StopReason::ToolCalls);
        let call = completion.message.tool_call.unwrap();
        assert!(call.id.starts_with("call_"));
        assert_eq!(call.arguments, "{\"term\": 24}");
        assert_eq!(completion.usage, Usage::default());
        Ok(())
    }

    #[test]
    fn test_response_without_choices() {
        assert!(openai_response_to_completion(&json!({"choices": []})).is_err());
    }

    #[test]
    fn test_context_length_error() {
        let error = json!({"code": "context_length_exceeded", "message": "too long"});
        let err = check_openai_context_length_error(&error).unwrap();
        assert_eq!(err.to_string(), "Context length exceeded. Message: too long");
        assert!(check_openai_context_length_error(&json!({"code": "other"})).is_none());
    }
}

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use crate::models::message::{Message, MessageContent};
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

lazy_static! {
    static ref INVALID_NAME_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
}

/// Arguments as the wire format wants them: a JSON encoded string
fn arguments_to_string(arguments: &Value) -> String {
    match arguments {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

/// Convert internal Message format to OpenAI's API message specification
///
/// Tool messages expand to one `tool` entry per result, since the API expects a
/// single `tool_call_id` per message.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        if message.role == Role::Tool {
            for response in message.tool_responses() {
                messages_spec.push(json!({
                    "role": "tool",
                    "content": response.content,
                    "tool_call_id": response.id,
                    "name": response.name,
                }));
            }
            continue;
        }

        let mut converted = json!({
            "role": message.role.as_str(),
        });

        if let Some(text) = message.text() {
            if !text.is_empty() {
                converted["content"] = json!(text);
            }
        }

        let tool_calls: Vec<Value> = message
            .content
            .iter()
            .filter_map(|content| match content {
                MessageContent::ToolRequest(request) => Some(json!({
                    "id": request.id,
                    "type": "function",
                    "function": {
                        "name": sanitize_function_name(&request.tool_call.name),
                        "arguments": arguments_to_string(&request.tool_call.arguments),
                    }
                })),
                _ => None,
            })
            .collect();

        if !tool_calls.is_empty() {
            converted["tool_calls"] = json!(tool_calls);
        }

        if converted.get("content").is_none() {
            // The API requires the field even when only tool calls are present
            converted["content"] = Value::Null;
            if tool_calls.is_empty() {
                converted["content"] = json!("");
            }
        }

        messages_spec.push(converted);
    }

    messages_spec
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
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to internal Message format
///
/// Tool call arguments are kept as the raw string the model produced; the
/// agent parses them right before dispatch.
pub fn openai_response_to_message(response: Value) -> Result<Message> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .cloned()
        .ok_or_else(|| anyhow!("Response contains no message: {}", response))?;

    let mut message = Message::assistant();

    if let Some(text) = original.get("content").and_then(|t| t.as_str()) {
        if !text.is_empty() {
            message = message.with_text(text);
        }
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(|t| t.as_array()) {
        for tool_call in tool_calls {
            let id = tool_call["id"].as_str().unwrap_or_default().to_string();
            let function_name = tool_call["function"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let arguments = match &tool_call["function"]["arguments"] {
                Value::Null => Value::String(String::new()),
                other => other.clone(),
            };
            message = message.with_tool_request(id, ToolCall::new(function_name, arguments));
        }
    }

    Ok(message)
}

/// Assemble a chat completion request body shared by the OpenAI-compatible backends
pub fn build_chat_payload(
    model: &str,
    temperature: Option<f32>,
    max_tokens: Option<i32>,
    messages: &[Message],
    tools: &[Tool],
) -> Result<Value> {
    let mut payload = json!({
        "model": model,
        "messages": messages_to_openai_spec(messages),
    });

    let tools_spec = tools_to_openai_spec(tools)?;
    if !tools_spec.is_empty() {
        payload["tools"] = json!(tools_spec);
    }
    if let Some(temperature) = temperature {
        payload["temperature"] = json!(temperature);
    }
    if let Some(tokens) = max_tokens {
        payload["max_tokens"] = json!(tokens);
    }

    Ok(payload)
}

/// Extract usage counters from a chat completion response
pub fn openai_usage(data: &Value) -> super::base::Usage {
    let usage = data.get("usage");
    let field = |name: &str| {
        usage
            .and_then(|u| u.get(name))
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
    };

    let input_tokens = field("prompt_tokens");
    let output_tokens = field("completion_tokens");
    let total_tokens = field("total_tokens").or_else(|| match (input_tokens, output_tokens) {
        (Some(input), Some(output)) => Some(input + output),
        _ => None,
    });

    super::base::Usage::new(input_tokens, output_tokens, total_tokens)
}

pub fn sanitize_function_name(name: &str) -> String {
    INVALID_NAME_CHARS.replace_all(name, "_").to_string()
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

/// Recognize the API's context length error so callers can report it plainly
pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?;
    if code.as_str() == Some("context_length_exceeded")
        || code.as_str() == Some("string_above_max_length")
    {
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
    use crate::models::message::ToolResponse;

    #[test]
    fn test_messages_to_openai_spec() {
        let messages = vec![
            Message::system().with_text("Be helpful"),
            Message::user().with_text("Weather in Oslo?"),
            Message::assistant().with_tool_request(
                "call_1",
                ToolCall::new("get_current_weather", json!({"city": "Oslo"})),
            ),
            Message::tool(ToolResponse {
                id: "call_1".to_string(),
                name: "get_current_weather".to_string(),
                content: "{\"temperature\":\"3°C\"}".to_string(),
                error: None,
            }),
        ];

        let spec = messages_to_openai_spec(&messages);
        assert_eq!(spec.len(), 4);
        assert_eq!(spec[0], json!({"role": "system", "content": "Be helpful"}));
        assert_eq!(spec[1]["role"], "user");
        assert_eq!(spec[2]["content"], Value::Null);
        assert_eq!(spec[2]["tool_calls"][0]["id"], "call_1");
        assert_eq!(
            spec[2]["tool_calls"][0]["function"]["arguments"],
            "{\"city\":\"Oslo\"}"
        );
        assert_eq!(spec[3]["role"], "tool");
        assert_eq!(spec[3]["tool_call_id"], "call_1");
        assert_eq!(spec[3]["content"], "{\"temperature\":\"3°C\"}");
    }

    #[test]
    fn test_raw_string_arguments_sent_unchanged() {
        let messages = vec![Message::assistant().with_tool_request(
            "call_1",
            ToolCall::new("search_attractions", json!("{\"location\": \"Paris\"}")),
        )];
        let spec = messages_to_openai_spec(&messages);
        assert_eq!(
            spec[0]["tool_calls"][0]["function"]["arguments"],
            "{\"location\": \"Paris\"}"
        );
    }

    #[test]
    fn test_tools_to_openai_spec_duplicate() {
        let tool = Tool::new("a", "first", json!({"type": "object"}));
        assert!(tools_to_openai_spec(&[tool.clone()]).is_ok());
        assert!(tools_to_openai_spec(&[tool.clone(), tool]).is_err());
    }

    #[test]
    fn test_openai_response_to_message_text() -> Result<()> {
        let response = json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]
        });
        let message = openai_response_to_message(response)?;
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text(), Some("Hello!".to_string()));
        assert!(!message.has_tool_requests());
        Ok(())
    }

    #[test]
    fn test_openai_response_to_message_tool_calls() -> Result<()> {
        let response = json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_7",
                    "type": "function",
                    "function": {"name": "search_attractions", "arguments": "{\"location\":\"Paris\",\"category\":\"museum\"}"}
                }]
            }}]
        });
        let message = openai_response_to_message(response)?;
        assert_eq!(message.text(), None);
        let requests = message.tool_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, "call_7");
        assert_eq!(
            requests[0].tool_call.parsed_arguments(),
            json!({"location": "Paris", "category": "museum"})
        );
        Ok(())
    }

    #[test]
    fn test_openai_response_without_choices() {
        assert!(openai_response_to_message(json!({"choices": []})).is_err());
    }

    #[test]
    fn test_usage_total_fallback() {
        let usage = openai_usage(&json!({"usage": {"prompt_tokens": 3, "completion_tokens": 4}}));
        assert_eq!(usage.total_tokens, Some(7));
        assert_eq!(openai_usage(&json!({})).total_tokens, None);
    }

    #[test]
    fn test_build_chat_payload() -> Result<()> {
        let messages = vec![
            Message::system().with_text("Be brief"),
            Message::user().with_text("Hi"),
        ];
        let tools = vec![Tool::new("a", "first", json!({"type": "object"}))];

        let payload = build_chat_payload("gpt-4o", Some(0.0), None, &messages, &tools)?;
        assert_eq!(payload["model"], "gpt-4o");
        assert_eq!(payload["messages"].as_array().map(|m| m.len()), Some(2));
        assert_eq!(payload["tools"][0]["function"]["name"], "a");
        assert_eq!(payload["temperature"], json!(0.0));
        assert!(payload.get("max_tokens").is_none());

        let bare = build_chat_payload("qwen2.5", None, Some(64), &messages, &[])?;
        assert!(bare.get("tools").is_none());
        assert!(bare.get("temperature").is_none());
        assert_eq!(bare["max_tokens"], 64);
        Ok(())
    }

    #[test]
    fn test_sanitize_function_name() {
        assert_eq!(sanitize_function_name("travel.search"), "travel_search");
    }

    #[test]
    fn test_context_length_error() {
        let error = json!({"code": "context_length_exceeded", "message": "too long"});
        let err = check_openai_context_length_error(&error).unwrap();
        assert_eq!(err.to_string(), "Context length exceeded. Message: too long");
        assert!(check_openai_context_length_error(&json!({"code": "other"})).is_none());
    }
}

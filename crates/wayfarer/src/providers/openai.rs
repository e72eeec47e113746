use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use super::base::{Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    build_chat_payload, check_openai_context_length_error, openai_response_to_message,
    openai_usage,
};
use crate::models::message::Message;
use crate::models::tool::Tool;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;

        Ok(Self { client, config })
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                // Error bodies carry the reason, e.g. an invalid key
                let body: Value = response.json().await.unwrap_or(Value::Null);
                match body.get("error") {
                    Some(error) => Err(anyhow!("OpenAI API error ({}): {}", status, error)),
                    None => Err(anyhow!("Request failed: {}", status)),
                }
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, messages: &[Message], tools: &[Tool]) -> Result<(Message, Usage)> {
        let payload = build_chat_payload(
            &self.config.model,
            self.config.temperature,
            self.config.max_tokens,
            messages,
            tools,
        )?;

        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            if let Some(err) = check_openai_context_length_error(error) {
                return Err(err.into());
            }
            return Err(anyhow!("OpenAI API error: {}", error));
        }

        let usage = openai_usage(&response);
        let message = openai_response_to_message(response)?;
        tracing::debug!(model = %self.config.model, ?usage, "completion received");

        Ok((message, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(host: String) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host,
            api_key: "test_api_key".to_string(),
            model: "gpt-4o".to_string(),
            temperature: Some(0.0),
            max_tokens: None,
        }
    }

    async fn setup_mock_server(response: ResponseTemplate) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test_api_key"))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(config(mock_server.uri())).unwrap();
        (mock_server, provider)
    }

    fn conversation() -> Vec<Message> {
        vec![
            Message::system().with_text("You are a helpful travel assistant."),
            Message::user().with_text("Hello?"),
        ]
    }

    #[tokio::test]
    async fn test_complete_basic() -> Result<()> {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello! Where are we headed?",
                    "tool_calls": null
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        });

        let (_server, provider) =
            setup_mock_server(ResponseTemplate::new(200).set_body_json(response_body)).await;

        let (message, usage) = provider.complete(&conversation(), &[]).await?;

        assert_eq!(message.text(), Some("Hello! Where are we headed?".to_string()));
        assert_eq!(usage, Usage::new(Some(12), Some(15), Some(27)));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_sends_system_message_first() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "temperature": 0.0,
                "messages": [
                    {"role": "system", "content": "You are a helpful travel assistant."},
                    {"role": "user", "content": "Hello?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hi"}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(config(mock_server.uri()))?;
        let (message, usage) = provider.complete(&conversation(), &[]).await?;
        assert_eq!(message.text(), Some("Hi".to_string()));
        assert_eq!(usage, Usage::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_tool_request() -> Result<()> {
        let response_body = json!({
            "id": "chatcmpl-tool",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "get_current_weather",
                            "arguments": "{\"city\":\"Paris\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {
                "prompt_tokens": 20,
                "completion_tokens": 15,
                "total_tokens": 35
            }
        });

        let (_server, provider) =
            setup_mock_server(ResponseTemplate::new(200).set_body_json(response_body)).await;

        let tool = Tool::new(
            "get_current_weather",
            "Get the current weather for a specific city.",
            json!({
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }),
        );

        let (message, usage) = provider.complete(&conversation(), &[tool]).await?;

        let requests = message.tool_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, "call_123");
        assert_eq!(requests[0].tool_call.name, "get_current_weather");
        assert_eq!(requests[0].tool_call.arguments, json!("{\"city\":\"Paris\"}"));
        assert_eq!(usage.total_tokens, Some(35));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_key_reports_api_error() -> Result<()> {
        let (_server, provider) = setup_mock_server(ResponseTemplate::new(401).set_body_json(
            json!({"error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}}),
        ))
        .await;

        let err = provider.complete(&conversation(), &[]).await.unwrap_err();
        assert!(err.to_string().contains("Incorrect API key provided"));
        Ok(())
    }

    #[tokio::test]
    async fn test_server_error() -> Result<()> {
        let (_server, provider) = setup_mock_server(ResponseTemplate::new(503)).await;

        let err = provider.complete(&conversation(), &[]).await.unwrap_err();
        assert!(err.to_string().contains("Server error: 503"));
        Ok(())
    }

    #[tokio::test]
    async fn test_context_length_error_in_body() -> Result<()> {
        let (_server, provider) = setup_mock_server(ResponseTemplate::new(200).set_body_json(
            json!({"error": {"code": "context_length_exceeded", "message": "too many tokens"}}),
        ))
        .await;

        let err = provider.complete(&conversation(), &[]).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Context length exceeded. Message: too many tokens"
        );
        Ok(())
    }
}

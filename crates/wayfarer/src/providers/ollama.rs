use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use super::base::{Provider, Usage};
use super::configs::OllamaProviderConfig;
use super::utils::{build_chat_payload, openai_response_to_message, openai_usage};
use crate::models::message::Message;
use crate::models::tool::Tool;

/// Talks to a local Ollama server through its OpenAI-compatible endpoint
pub struct OllamaProvider {
    client: Client,
    config: OllamaProviderConfig,
}

impl OllamaProvider {
    pub fn new(config: OllamaProviderConfig) -> Result<Self> {
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

        let response = self.client.post(&url).json(&payload).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => Err(anyhow!("Request failed: {}", status)),
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
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
            return Err(anyhow!("Ollama error: {}", error));
        }

        let usage = openai_usage(&response);
        let message = openai_response_to_message(response)?;

        Ok((message, usage))
    }
}

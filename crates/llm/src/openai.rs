//! OpenAI-compatible chat-completions client. Calls are bounded by the
//! configured timeout; every failure maps to a recoverable
//! `CommerceError::Llm` so callers can fall back.

use crate::TextGenerator;
use async_trait::async_trait;
use commerce_core::config::LlmConfig;
use commerce_core::error::{CommerceError, CommerceResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct OpenAiGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl OpenAiGenerator {
    pub fn new(config: &LlmConfig, api_key: String) -> CommerceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CommerceError::Llm(format!("client build failed: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> CommerceResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CommerceError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CommerceError::Llm(format!(
                "upstream returned status {status}"
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CommerceError::Llm(format!("malformed response body: {e}")))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CommerceError::Llm("response contained no choices".to_string()))?;

        debug!(model = %self.model, chars = content.len(), "LLM response received");
        Ok(content)
    }
}

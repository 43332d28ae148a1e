//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Sends the rendered prompt as one user message. Works against any endpoint speaking
//! the Chat Completions protocol (OpenAI, vLLM, Ollama's `/v1`), selected by base URL.
//! Sampling defaults to temperature 0.2 and top_p 0.4, which keeps SQL generation close
//! to deterministic.
//!
//! `stop` is not sent with the request; [`LlmClient::complete`] cuts the output instead,
//! since several compatible servers reject or ignore the field.
//!
//! **Interaction**: Implements `LlmClient`; built by `Settings::build_pipeline`.

use async_trait::async_trait;
use tracing::{debug, trace};

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs,
    },
    Client,
};

use crate::error::CompletionError;
use crate::llm::{LlmClient, LlmResponse, LlmUsage};

pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TOP_P: f32 = 0.4;

/// OpenAI-compatible chat client.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
    top_p: Option<f32>,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            temperature: Some(DEFAULT_TEMPERATURE),
            top_p: Some(DEFAULT_TOP_P),
        }
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: Some(DEFAULT_TEMPERATURE),
            top_p: Some(DEFAULT_TOP_P),
        }
    }

    /// Set temperature (0–2). `None` leaves the server default.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: Option<f32>) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, prompt: &str) -> Result<LlmResponse, CompletionError> {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage::from(prompt),
        )]);
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        if let Some(p) = self.top_p {
            args.top_p(p);
        }
        let request = args
            .build()
            .map_err(|e| CompletionError::Request(format!("request build failed: {}", e)))?;

        debug!(
            trace_id = %trace_id,
            model = %self.model,
            prompt_len = prompt.len(),
            temperature = ?self.temperature,
            top_p = ?self.top_p,
            "OpenAI chat create"
        );
        if let Ok(js) = serde_json::to_string_pretty(&request) {
            trace!(trace_id = %trace_id, request = %js, "OpenAI request body");
        }

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| CompletionError::Request(format!("OpenAI API error: {}", e)))?;

        let usage = response.usage.as_ref().map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyResponse)?;
        let content = choice.message.content.unwrap_or_default();
        trace!(trace_id = %trace_id, content = %content, usage = ?usage, "OpenAI completion");

        Ok(LlmResponse { content, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_low_temperature_sampling() {
        let llm = ChatOpenAI::with_config(OpenAIConfig::new().with_api_key("sk-test"), "gpt-4o");
        assert_eq!(llm.model(), "gpt-4o");
        assert_eq!(llm.temperature, Some(DEFAULT_TEMPERATURE));
        assert_eq!(llm.top_p, Some(DEFAULT_TOP_P));
    }

    #[test]
    fn sampling_can_be_cleared() {
        let llm = ChatOpenAI::with_config(OpenAIConfig::new(), "m")
            .with_temperature(None)
            .with_top_p(Some(0.9));
        assert_eq!(llm.temperature, None);
        assert_eq!(llm.top_p, Some(0.9));
    }

    /// Unreachable base URL surfaces as a request error, not a panic.
    #[tokio::test]
    async fn unreachable_endpoint_is_request_error() {
        let config = OpenAIConfig::new()
            .with_api_key("sk-test")
            .with_api_base("http://127.0.0.1:1/v1");
        let llm = ChatOpenAI::with_config(config, "m");
        let err = llm.invoke("hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::Request(_)));
    }
}

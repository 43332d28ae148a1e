//! Completion provider abstraction.
//!
//! The pipeline depends on a callable that turns a rendered prompt into raw text; this
//! module defines that trait ([`LlmClient`]), the OpenAI-compatible implementation
//! ([`ChatOpenAI`], which also covers local runtimes exposing `/v1/chat/completions`)
//! and a scripted [`MockLlm`] for tests.
//!
//! Stop sequences are enforced client-side by [`LlmClient::complete`], so a provider that
//! ignores `stop` still yields text cut at the first stop marker.

mod mock;
mod openai;

pub use mock::MockLlm;
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::CompletionError;

/// Token usage for one completion call.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Raw completion text plus optional usage.
#[derive(Clone, Debug, Default)]
pub struct LlmResponse {
    pub content: String,
    pub usage: Option<LlmUsage>,
}

/// Text-completion capability: one prompt in, one completion out.
///
/// Implementations are stateless facades over an external model. No retries happen here;
/// a failure aborts the caller's request.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends `prompt` as a single user message and returns the raw completion.
    async fn invoke(&self, prompt: &str) -> Result<LlmResponse, CompletionError>;

    /// Invokes the model and truncates the output at the first stop sequence.
    async fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String, CompletionError> {
        let response = self.invoke(prompt).await?;
        Ok(enforce_stop(&response.content, stop).to_string())
    }
}

/// Returns `text` up to the earliest occurrence of any stop sequence (or all of it).
pub fn enforce_stop<'a>(text: &'a str, stop: &[&str]) -> &'a str {
    let cut = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s))
        .min();
    match cut {
        Some(i) => &text[..i],
        None => text,
    }
}

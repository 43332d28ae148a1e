//! Mock LLM for tests and offline runs.
//!
//! Returns scripted completions in order; once the script runs out, the last entry is
//! repeated. Records every prompt it receives so tests can assert on rendered prompts.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CompletionError;
use crate::llm::{LlmClient, LlmResponse};

/// One scripted reply.
#[derive(Clone, Debug)]
enum Scripted {
    Text(String),
    Fail(String),
}

/// Mock LLM: scripted replies, prompt capture.
///
/// **Interaction**: Implements `LlmClient`; used by `Pipeline` in tests and by the serve
/// and cli test suites.
pub struct MockLlm {
    script: Vec<Scripted>,
    calls: Mutex<Vec<String>>,
}

impl MockLlm {
    /// Always returns `content`.
    pub fn with_reply(content: impl Into<String>) -> Self {
        Self::with_replies([content.into()])
    }

    /// Returns the replies in order, repeating the last one.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: replies
                .into_iter()
                .map(|s| Scripted::Text(s.into()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with [`CompletionError::Request`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: vec![Scripted::Fail(message.into())],
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Appends a failing step after the current script (builder).
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.script.push(Scripted::Fail(message.into()));
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, prompt: &str) -> Result<LlmResponse, CompletionError> {
        let index = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|e| CompletionError::Request(e.to_string()))?;
            calls.push(prompt.to_string());
            calls.len() - 1
        };
        let step = self
            .script
            .get(index)
            .or_else(|| self.script.last())
            .ok_or(CompletionError::EmptyResponse)?;
        match step {
            Scripted::Text(s) => Ok(LlmResponse {
                content: s.clone(),
                usage: None,
            }),
            Scripted::Fail(m) => Err(CompletionError::Request(m.clone())),
        }
    }
}

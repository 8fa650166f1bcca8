use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

/// A single completion request
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// JSON schema the reply must conform to (structured output)
    pub json_schema: Option<serde_json::Value>,
}

impl LlmRequest {
    /// Create a plain text request
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Something that can turn a prompt into a completion
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Human readable provider name
    fn name(&self) -> &'static str;

    /// Check that the provider can be used (API key present, binary installed, ...)
    fn is_available(&self) -> Result<()>;
}

/// Lets one provider sit in several places (e.g. a fallback chain and a test)
#[async_trait]
impl<P: LlmProvider + ?Sized> LlmProvider for Arc<P> {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        (**self).complete(request).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_available(&self) -> Result<()> {
        (**self).is_available()
    }
}

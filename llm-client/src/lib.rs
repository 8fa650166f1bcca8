//! Shared LLM client for the cli-programs workspace
//!
//! Programs load a [`Config`], pick a preset, and get back a boxed
//! [`LlmProvider`] (optionally wrapped in a [`FallbackProvider`] chain).
//! Structured, schema-checked calls go through [`Prompt`].

pub mod config;
pub mod error;
pub mod fallback;
pub mod prompt;
pub mod provider;
pub mod providers;

pub use config::{Config, ModelPreset, ProviderConfig};
pub use error::{LlmError, Result};
pub use fallback::{FallbackProvider, get_provider_with_fallback};
pub use prompt::Prompt;
pub use provider::{LlmProvider, LlmRequest, LlmResponse, TokenUsage};
pub use providers::{GeminiProvider, MockProvider, OpenAICompatibleProvider, get_provider};

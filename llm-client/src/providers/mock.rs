use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse};

enum Behavior {
    Succeed(String),
    Fail(LlmError),
}

/// Scripted provider for tests
///
/// Never touches the network. The last request it received is kept so
/// tests can inspect the rendered prompt and schema.
pub struct MockProvider {
    behavior: Behavior,
    last_request: Mutex<Option<LlmRequest>>,
}

impl MockProvider {
    /// Always reply with `content`
    pub fn always_succeeds(content: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Succeed(content.into()),
            last_request: Mutex::new(None),
        }
    }

    /// Always fail with a copy of `error` (same variant, same fields)
    pub fn always_fails(error: LlmError) -> Self {
        Self {
            behavior: Behavior::Fail(error),
            last_request: Mutex::new(None),
        }
    }

    /// The most recent request passed to `complete`
    pub fn last_request(&self) -> Option<LlmRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// `LlmError` can't derive `Clone` because of `io::Error`
fn duplicate(error: &LlmError) -> LlmError {
    match error {
        LlmError::ApiError {
            message,
            status_code,
        } => LlmError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        LlmError::ServerOverloaded { message } => LlmError::ServerOverloaded {
            message: message.clone(),
        },
        LlmError::MissingApiKey { provider, env_var } => LlmError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        LlmError::ConfigError(m) => LlmError::ConfigError(m.clone()),
        LlmError::PresetNotFound(m) => LlmError::PresetNotFound(m.clone()),
        LlmError::InvalidProvider(m) => LlmError::InvalidProvider(m.clone()),
        LlmError::ProviderUnavailable(m) => LlmError::ProviderUnavailable(m.clone()),
        LlmError::Template(m) => LlmError::Template(m.clone()),
        LlmError::SchemaValidation(m) => LlmError::SchemaValidation(m.clone()),
        LlmError::Io(e) => LlmError::Io(std::io::Error::new(e.kind(), e.to_string())),
        LlmError::Toml(e) => LlmError::Toml(e.clone()),
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request);
        }

        match &self.behavior {
            Behavior::Succeed(content) => Ok(LlmResponse {
                content: content.clone(),
                model: "mock".to_string(),
                usage: None,
            }),
            Behavior::Fail(error) => Err(duplicate(error)),
        }
    }

    fn name(&self) -> &'static str {
        "Mock"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

use thiserror::Error;

/// Errors produced by the LLM client and its providers
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error: {message}")]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// HTTP 503 from the provider
    #[error("Server overloaded: {message}")]
    ServerOverloaded { message: String },

    #[error("{provider} API key not found. Set the {env_var} environment variable")]
    MissingApiKey { provider: String, env_var: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown preset: {0}")]
    PresetNotFound(String),

    #[error("Unknown provider: {0}")]
    InvalidProvider(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Template error: {0}")]
    Template(String),

    /// The model replied, but the reply does not match the declared output shape
    #[error("Output failed schema validation: {0}")]
    SchemaValidation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl LlmError {
    /// Whether another provider might succeed where this one failed.
    ///
    /// Transport failures (no status), 429 and 5xx qualify. Bad credentials,
    /// bad requests, config problems and replies that don't fit the output
    /// shape do not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::ServerOverloaded { .. } | LlmError::ProviderUnavailable(_) => true,
            LlmError::ApiError { status_code, .. } => match status_code {
                None => true,
                Some(code) => *code == 429 || *code >= 500,
            },
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status_code: Option<u16>) -> LlmError {
        LlmError::ApiError {
            message: "boom".to_string(),
            status_code,
        }
    }

    #[test]
    fn test_transient_errors() {
        assert!(api(None).is_transient());
        assert!(api(Some(429)).is_transient());
        assert!(api(Some(500)).is_transient());
        assert!(LlmError::ServerOverloaded { message: String::new() }.is_transient());
        assert!(LlmError::ProviderUnavailable("down".into()).is_transient());
    }

    #[test]
    fn test_permanent_errors() {
        assert!(!api(Some(400)).is_transient());
        assert!(!api(Some(401)).is_transient());
        assert!(!LlmError::MissingApiKey {
            provider: "Gemini".into(),
            env_var: "GEMINI_API_KEY".into()
        }
        .is_transient());
        assert!(!LlmError::SchemaValidation("missing field".into()).is_transient());
        assert!(!LlmError::ConfigError("bad".into()).is_transient());
    }
}

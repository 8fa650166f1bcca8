mod gemini;
mod mock;
mod openai_compatible;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai_compatible::OpenAICompatibleProvider;

use crate::config::{ModelPreset, ProviderConfig};
use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;

/// Resolve the API key for a provider.
///
/// Lookup order: the preset's `api_key_env`, the provider config's
/// `api_key_env`, then the provider's conventional variable.
fn resolve_api_key(
    provider: &str,
    preset: &ModelPreset,
    provider_config: Option<&ProviderConfig>,
    default_env: &str,
) -> Result<String> {
    let env_var = preset
        .api_key_env
        .as_deref()
        .or_else(|| provider_config.and_then(|c| c.api_key_env.as_deref()))
        .unwrap_or(default_env);

    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(LlmError::MissingApiKey {
            provider: provider.to_string(),
            env_var: env_var.to_string(),
        }),
    }
}

/// Create a provider from a preset
pub fn get_provider(
    preset: &ModelPreset,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn LlmProvider>> {
    let base_url = provider_config.and_then(|c| c.base_url.as_deref());

    let provider: Box<dyn LlmProvider> = match preset.provider.as_str() {
        "gemini" => {
            let api_key = resolve_api_key("Gemini", preset, provider_config, "GEMINI_API_KEY")?;
            let provider = GeminiProvider::new(&preset.model, api_key)?;
            match base_url {
                Some(url) => Box::new(provider.with_base_url(url)),
                None => Box::new(provider),
            }
        }
        "openai" => {
            let api_key = resolve_api_key("OpenAI", preset, provider_config, "OPENAI_API_KEY")?;
            Box::new(OpenAICompatibleProvider::new(
                &preset.model,
                base_url.unwrap_or("https://api.openai.com/v1"),
                Some(api_key),
                "OpenAI",
            )?)
        }
        "openrouter" => {
            let api_key =
                resolve_api_key("OpenRouter", preset, provider_config, "OPENROUTER_API_KEY")?;
            Box::new(OpenAICompatibleProvider::openrouter(&preset.model, api_key)?)
        }
        "lm-studio" => Box::new(OpenAICompatibleProvider::lm_studio(&preset.model, base_url)?),
        other => return Err(LlmError::InvalidProvider(other.to_string())),
    };

    Ok(provider)
}

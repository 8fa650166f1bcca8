//! Preset fallback chains
//!
//! A preset may name another preset as its `fallback`. Following those links
//! from the requested preset gives an ordered chain. Requests go to the head
//! of the chain and only move down it when the failure is transient
//! (see [`LlmError::is_transient`]); anything else is returned as-is.

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::providers::get_provider;

struct Link {
    preset: String,
    provider: Box<dyn LlmProvider>,
}

/// Providers tried in preset order
pub struct FallbackProvider {
    links: Vec<Link>,
}

impl std::fmt::Debug for FallbackProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackProvider")
            .field("presets", &self.preset_names())
            .finish()
    }
}

impl FallbackProvider {
    /// Build a chain from already constructed providers
    pub fn from_chain(chain: Vec<(String, Box<dyn LlmProvider>)>) -> Self {
        let links = chain
            .into_iter()
            .map(|(preset, provider)| Link { preset, provider })
            .collect();
        Self { links }
    }

    /// Preset at the head of the chain
    pub fn primary_name(&self) -> &str {
        self.links
            .first()
            .map(|link| link.preset.as_str())
            .unwrap_or("unknown")
    }

    pub fn chain_len(&self) -> usize {
        self.links.len()
    }

    pub fn preset_names(&self) -> Vec<&str> {
        self.links.iter().map(|link| link.preset.as_str()).collect()
    }
}

#[async_trait]
impl LlmProvider for FallbackProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let Some((head, tail)) = self.links.split_first() else {
            return Err(LlmError::ProviderUnavailable(
                "No providers in fallback chain".to_string(),
            ));
        };

        let mut failed = head;
        let mut error = match head.provider.complete(request.clone()).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        for link in tail {
            if !error.is_transient() {
                return Err(error);
            }
            log::warn!(
                "Preset '{}' failed ({}), trying '{}'",
                failed.preset, error, link.preset
            );

            match link.provider.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    failed = link;
                    error = e;
                }
            }
        }

        Err(error)
    }

    fn name(&self) -> &'static str {
        self.links
            .first()
            .map(|link| link.provider.name())
            .unwrap_or("FallbackProvider")
    }

    fn is_available(&self) -> Result<()> {
        if self
            .links
            .iter()
            .any(|link| link.provider.is_available().is_ok())
        {
            Ok(())
        } else {
            Err(LlmError::ProviderUnavailable(
                "No providers in fallback chain are available".to_string(),
            ))
        }
    }
}

/// Preset names reachable from `start` through `fallback` links, in order.
///
/// Every name must exist, and a preset may appear only once.
pub fn resolve_chain(config: &Config, start: &str) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    let mut next = Some(start);

    while let Some(name) = next {
        if names.iter().any(|seen| seen == name) {
            return Err(LlmError::ConfigError(format!(
                "Circular fallback: {} -> {}",
                names.join(" -> "),
                name
            )));
        }
        let preset = config.get_preset(name)?;
        names.push(name.to_string());
        next = preset.fallback.as_deref();
    }

    Ok(names)
}

/// Build the fallback chain for a preset.
///
/// Presets whose API key isn't set are left out of the chain. If that
/// leaves nothing, the first missing-key error is returned so the user sees
/// which variable to set.
///
/// # Example config
/// ```toml
/// [presets.gemini-free]
/// provider = "gemini"
/// model = "gemini-2.0-flash"
/// api_key_env = "GEMINI_API_KEY_FREE"
/// fallback = "local"
///
/// [presets.local]
/// provider = "lm-studio"
/// model = "qwen2.5-7b-instruct"
/// ```
pub fn get_provider_with_fallback(config: &Config, preset_name: &str) -> Result<FallbackProvider> {
    let mut links = Vec::new();
    let mut first_missing_key = None;

    for name in resolve_chain(config, preset_name)? {
        let preset = config.get_preset(&name)?;
        match get_provider(preset, config.get_provider_config(&preset.provider)) {
            Ok(provider) => links.push(Link {
                preset: name,
                provider,
            }),
            Err(e @ LlmError::MissingApiKey { .. }) => {
                log::warn!("Skipping preset '{}': {}", name, e);
                first_missing_key.get_or_insert(e);
            }
            Err(e) => return Err(e),
        }
    }

    if links.is_empty() {
        return Err(first_missing_key.unwrap_or_else(|| {
            LlmError::ConfigError(format!("No providers available for preset '{}'", preset_name))
        }));
    }

    Ok(FallbackProvider { links })
}

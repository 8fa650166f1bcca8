//! Preset-based LLM configuration
//!
//! Loaded from `~/.config/cli-programs/llm.toml`. Every tool in the
//! workspace picks a preset (by name, or its per-program default) and the
//! preset decides the provider, the model and an optional fallback.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LlmError, Result};

const CONFIG_FILE: &str = "llm.toml";
const DEFAULT_PRESET: &str = "gemini-flash";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Preset used when neither the caller nor `defaults` names one
    #[serde(default = "default_preset")]
    pub default_preset: String,

    /// Per-program default presets, keyed by program name
    #[serde(default)]
    pub defaults: HashMap<String, String>,

    #[serde(default = "default_presets")]
    pub presets: HashMap<String, ModelPreset>,

    /// Per-provider settings, keyed by provider name
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelPreset {
    pub provider: String,
    pub model: String,
    /// Preset to try when this one fails
    #[serde(default)]
    pub fallback: Option<String>,
    /// Environment variable holding the API key, overrides the provider default
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
}

fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}

fn default_presets() -> HashMap<String, ModelPreset> {
    let mut presets = HashMap::new();
    presets.insert(
        DEFAULT_PRESET.to_string(),
        ModelPreset {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            fallback: None,
            api_key_env: None,
        },
    );
    presets.insert(
        "lm-studio".to_string(),
        ModelPreset {
            provider: "lm-studio".to_string(),
            model: "local-model".to_string(),
            fallback: None,
            api_key_env: None,
        },
    );
    presets
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_preset: default_preset(),
            defaults: HashMap::new(),
            presets: default_presets(),
            providers: HashMap::new(),
        }
    }
}

impl Config {
    /// Get the config directory path.
    ///
    /// Can be overridden via the `LLM_CLIENT_CONFIG_DIR` environment variable.
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(override_dir) = std::env::var("LLM_CLIENT_CONFIG_DIR") {
            return Ok(PathBuf::from(override_dir));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| LlmError::ConfigError("Could not determine home directory".into()))?;
        Ok(home.join(".config").join("cli-programs"))
    }

    /// Get the config file path: ~/.config/cli-programs/llm.toml
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No LLM config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn get_preset(&self, name: &str) -> Result<&ModelPreset> {
        self.presets
            .get(name)
            .ok_or_else(|| LlmError::PresetNotFound(name.to_string()))
    }

    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider)
    }

    /// Preset name a program should use when none was given explicitly
    pub fn get_default_for_program(&self, program: &str) -> &str {
        self.defaults
            .get(program)
            .map(String::as_str)
            .unwrap_or(self.default_preset.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_preset, "gemini-flash");
        let preset = config.get_preset("gemini-flash").unwrap();
        assert_eq!(preset.provider, "gemini");
        assert_eq!(preset.model, "gemini-2.0-flash");
        assert!(config.get_preset("lm-studio").is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
default_preset = "router"

[defaults]
recommend-voice = "local"

[presets.router]
provider = "openrouter"
model = "google/gemini-2.0-flash-001"
fallback = "local"

[presets.local]
provider = "lm-studio"
model = "qwen2.5-7b-instruct"

[providers.lm-studio]
base_url = "http://localhost:4321/v1"
"#;
        let config = Config::parse(toml_str).unwrap();
        assert_eq!(config.default_preset, "router");
        assert_eq!(config.get_default_for_program("recommend-voice"), "local");
        assert_eq!(config.get_default_for_program("gc"), "router");
        assert_eq!(
            config.get_preset("router").unwrap().fallback.as_deref(),
            Some("local")
        );
        assert_eq!(
            config
                .get_provider_config("lm-studio")
                .and_then(|p| p.base_url.as_deref()),
            Some("http://localhost:4321/v1")
        );
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.default_preset, "gemini-flash");
        assert!(config.get_preset("gemini-flash").is_ok());
    }

    #[test]
    fn test_unknown_preset() {
        let config = Config::default();
        let err = config.get_preset("nope").unwrap_err();
        assert!(matches!(err, LlmError::PresetNotFound(ref name) if name == "nope"));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::parse("presets = 3");
        assert!(matches!(result, Err(LlmError::Toml(_))));
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("llm.toml")).unwrap();
        assert_eq!(config.default_preset, "gemini-flash");
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("llm.toml");
        fs::write(&path, "default_preset = \"lm-studio\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_preset, "lm-studio");
    }
}

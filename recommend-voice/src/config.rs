// recommend-voice configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_VOICES: [&str; 2] = ["Algenib", "Achernar"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceConfig {
    /// Voices the model may choose from, in the order they are offered
    #[serde(default = "default_allowed_voices")]
    pub allowed_voices: Vec<String>,

    /// LLM preset (None uses the llm.toml default for this program)
    #[serde(default)]
    pub preset: Option<String>,

    /// Reject recommendations naming a voice outside `allowed_voices`
    #[serde(default)]
    pub strict: bool,
}

fn default_allowed_voices() -> Vec<String> {
    DEFAULT_VOICES.iter().map(|v| v.to_string()).collect()
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            allowed_voices: default_allowed_voices(),
            preset: None,
            strict: false,
        }
    }
}

impl VoiceConfig {
    /// Get the config directory path.
    ///
    /// Can be overridden via the `RECOMMEND_VOICE_CONFIG_DIR` environment variable.
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(override_dir) = std::env::var("RECOMMEND_VOICE_CONFIG_DIR") {
            return Ok(PathBuf::from(override_dir));
        }
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("cli-programs"))
    }

    /// Get the config file path: ~/.config/cli-programs/recommend-voice.toml
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("recommend-voice.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: VoiceConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.allowed_voices.is_empty() {
            anyhow::bail!("allowed_voices must name at least one voice");
        }
        if self.allowed_voices.iter().any(|v| v.trim().is_empty()) {
            anyhow::bail!("allowed_voices contains a blank voice name");
        }
        Ok(())
    }

    pub fn is_allowed(&self, voice: &str) -> bool {
        self.allowed_voices.iter().any(|v| v == voice)
    }
}

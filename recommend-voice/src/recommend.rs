//! Voice recommendation request
//!
//! Fills the recommendation prompt with the caller's text, runs it through
//! an [`LlmProvider`] and hands back the model's structured answer as-is.

use llm_client::{LlmError, LlmProvider, Prompt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::VoiceConfig;
use crate::prompts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendSuitableVoiceInput {
    /// The text input for which a voice is to be recommended
    pub text: String,
}

impl RecommendSuitableVoiceInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendSuitableVoiceOutput {
    pub voice_recommendation: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error(transparent)]
    Upstream(#[from] LlmError),

    #[error("The model returned no voice recommendation")]
    EmptyOutput,

    #[error("The model recommended '{voice}', which is not one of: {}", .allowed.join(", "))]
    UnknownVoice { voice: String, allowed: Vec<String> },
}

pub struct VoiceRecommender {
    prompt: Prompt<RecommendSuitableVoiceInput, RecommendSuitableVoiceOutput>,
    config: VoiceConfig,
}

impl VoiceRecommender {
    pub fn new(config: VoiceConfig) -> Result<Self, RecommendError> {
        let prompt = Prompt::new(
            prompts::PROMPT_NAME,
            prompts::RECOMMENDATION_TEMPLATE,
            prompts::input_schema(),
            prompts::output_schema(),
        )?
        .with_var("voices", prompts::voice_list(&config.allowed_voices));
        Ok(Self { prompt, config })
    }

    pub fn config(&self) -> &VoiceConfig {
        &self.config
    }

    /// Render the prompt that would be sent for `input`
    pub fn render(&self, input: &RecommendSuitableVoiceInput) -> Result<String, RecommendError> {
        Ok(self.prompt.render(input)?)
    }

    pub async fn recommend(
        &self,
        provider: &dyn LlmProvider,
        input: &RecommendSuitableVoiceInput,
    ) -> Result<RecommendSuitableVoiceOutput, RecommendError> {
        let output = self
            .prompt
            .execute(provider, input)
            .await?
            .ok_or(RecommendError::EmptyOutput)?;

        if !self.config.is_allowed(&output.voice_recommendation) {
            if self.config.strict {
                return Err(RecommendError::UnknownVoice {
                    voice: output.voice_recommendation,
                    allowed: self.config.allowed_voices.clone(),
                });
            }
            log::warn!(
                "Model recommended '{}', which is not one of the allowed voices ({})",
                output.voice_recommendation,
                self.config.allowed_voices.join(", ")
            );
        }

        Ok(output)
    }
}

/// Recommend one of the default voices for `input.text`
pub async fn recommend_suitable_voice(
    provider: &dyn LlmProvider,
    input: RecommendSuitableVoiceInput,
) -> Result<RecommendSuitableVoiceOutput, RecommendError> {
    VoiceRecommender::new(VoiceConfig::default())?
        .recommend(provider, &input)
        .await
}

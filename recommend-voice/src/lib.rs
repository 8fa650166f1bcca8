//! Recommend which synthetic voice suits a piece of text.

pub mod config;
pub mod prompts;
pub mod recommend;

pub use config::VoiceConfig;
pub use recommend::{
    RecommendError, RecommendSuitableVoiceInput, RecommendSuitableVoiceOutput, VoiceRecommender,
    recommend_suitable_voice,
};

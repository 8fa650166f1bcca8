// LLM prompt templates

use serde_json::{Value, json};

pub const PROMPT_NAME: &str = "recommendSuitableVoicePrompt";

/// Recommendation instructions.
///
/// `{{{voices}}}` is filled from [`voice_list`], `{{{text}}}` from the input.
pub const RECOMMENDATION_TEMPLATE: &str = r#"You are an AI voice recommender. Given the following text, recommend a suitable voice from the available voices ({{{voices}}}). Explain why you recommended the voice.

Text: {{{text}}}

Respond with the voice recommendation and the reason for your recommendation.
"#;

/// The allowed voices as they appear in the prompt
pub fn voice_list(allowed_voices: &[String]) -> String {
    allowed_voices.join(", ")
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": {
                "type": "string",
                "description": "The text input for which a voice is to be recommended."
            }
        },
        "required": ["text"]
    })
}

pub fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "voiceRecommendation": {
                "type": "string",
                "description": "The recommended voice for the given text."
            },
            "reason": {
                "type": "string",
                "description": "Explanation of why the voice was recommended."
            }
        },
        "required": ["voiceRecommendation", "reason"],
        "additionalProperties": false
    })
}

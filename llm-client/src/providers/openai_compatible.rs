//! OpenAI-compatible API provider
//!
//! Used for providers that implement the OpenAI chat completions API:
//! - OpenAI
//! - OpenRouter
//! - LM Studio
//! - And others

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse, TokenUsage};

/// Provider for OpenAI-compatible APIs
pub struct OpenAICompatibleProvider {
    model: String,
    base_url: String,
    api_key: Option<String>,
    name: &'static str,
    client: Client,
}

impl OpenAICompatibleProvider {
    /// Create a new OpenAI-compatible provider
    pub fn new(
        model: &str,
        base_url: &str,
        api_key: Option<String>,
        name: &'static str,
    ) -> Result<Self> {
        let client = Client::new();

        Ok(Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            name,
            client,
        })
    }

    /// Create an OpenRouter provider
    pub fn openrouter(model: &str, api_key: String) -> Result<Self> {
        Self::new(
            model,
            "https://openrouter.ai/api/v1",
            Some(api_key),
            "OpenRouter",
        )
    }

    /// Create an LM Studio provider (local, no API key required)
    pub fn lm_studio(model: &str, base_url: Option<&str>) -> Result<Self> {
        let url = base_url.unwrap_or("http://127.0.0.1:1234/v1");
        Self::new(model, url, None, "LM Studio")
    }

    fn build_request(&self, request: LlmRequest) -> ChatCompletionRequest {
        let mut messages = Vec::new();

        if let Some(system) = request.system_prompt {
            messages.push(Message {
                role: "system".to_string(),
                content: system,
            });
        }

        messages.push(Message {
            role: "user".to_string(),
            content: request.prompt,
        });

        // Build response_format if json_schema is provided
        let response_format = request.json_schema.map(|schema| ResponseFormat {
            format_type: "json_schema".to_string(),
            json_schema: JsonSchemaWrapper {
                name: "response".to_string(),
                strict: true,
                schema,
            },
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format,
        }
    }
}

// OpenAI API request/response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Response format for structured output
#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaWrapper,
}

/// Wrapper for JSON schema in response_format
#[derive(Debug, Serialize)]
struct JsonSchemaWrapper {
    name: String,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    // null when the model refuses or only calls tools
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Map a non-success status and body to an error
fn error_from_status(status: u16, body: String) -> LlmError {
    let message = if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&body) {
        error_response.error.message
    } else {
        body
    };

    // 503 is kept separate so callers can retry
    if status == 503 {
        return LlmError::ServerOverloaded { message };
    }

    LlmError::ApiError {
        message,
        status_code: Some(status),
    }
}

fn into_response(chat_response: ChatCompletionResponse, model: &str) -> LlmResponse {
    let content = chat_response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    let usage = chat_response.usage.map(|u| TokenUsage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
    });

    LlmResponse {
        content,
        model: model.to_string(),
        usage,
    }
}

#[async_trait]
impl LlmProvider for OpenAICompatibleProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let chat_request = self.build_request(request);
        let url = format!("{}/chat/completions", self.base_url);

        log::debug!("POST {} (model: {})", url, self.model);

        let mut request_builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        // Only add Authorization header if API key is provided
        if let Some(ref api_key) = self.api_key {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request_builder
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| LlmError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(error_from_status(status.as_u16(), error_text));
        }

        let chat_response: ChatCompletionResponse =
            response.json().await.map_err(|e| LlmError::ApiError {
                message: format!("Failed to parse response: {}", e),
                status_code: None,
            })?;

        Ok(into_response(chat_response, &self.model))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> Result<()> {
        // API key was provided in constructor
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_with_schema_uses_response_format() {
        let provider = OpenAICompatibleProvider::lm_studio("qwen", None).unwrap();
        let request = LlmRequest {
            prompt: "pick a voice".to_string(),
            system_prompt: Some("be brief".to_string()),
            max_tokens: Some(200),
            temperature: None,
            json_schema: Some(json!({"type": "object"})),
        };

        let body = serde_json::to_value(provider.build_request(request)).unwrap();

        assert_eq!(body["model"], "qwen");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "pick a voice");
        assert_eq!(body["max_tokens"], 200);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(
            body["response_format"]["json_schema"]["schema"],
            json!({"type": "object"})
        );
    }

    #[test]
    fn test_plain_request_has_no_response_format() {
        let provider = OpenAICompatibleProvider::lm_studio("qwen", None).unwrap();
        let body = serde_json::to_value(provider.build_request(LlmRequest::new("hi"))).unwrap();

        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider =
            OpenAICompatibleProvider::new("m", "http://localhost:1234/v1/", None, "Local").unwrap();
        assert_eq!(provider.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn test_parse_response() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"a\":1}"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let response = into_response(parsed, "m");

        assert_eq!(response.content, "{\"a\":1}");
        assert_eq!(
            response.usage,
            Some(TokenUsage {
                input_tokens: 12,
                output_tokens: 5
            })
        );
    }

    #[test]
    fn test_parse_response_without_choices_is_empty() {
        let parsed: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(into_response(parsed, "m").content, "");
    }

    #[test]
    fn test_error_mapping() {
        let err = error_from_status(401, r#"{"error": {"message": "bad key"}}"#.to_string());
        assert!(matches!(
            err,
            LlmError::ApiError { ref message, status_code: Some(401) } if message == "bad key"
        ));

        let err = error_from_status(503, "busy".to_string());
        assert!(matches!(err, LlmError::ServerOverloaded { ref message } if message == "busy"));
    }
}

//! Claude API client for the Anthropic Messages API

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::{AiError, Completion, InsightProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const API_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Claude Messages API
#[derive(Clone)]
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Individual content block within a response
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Request body for the Messages API
#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message>,
}

/// Token accounting returned with each response
#[derive(Debug, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Response from the Messages API
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

/// Error detail from the Messages API
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl ClaudeClient {
    /// Create a new client with the given API key and default settings
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 150,
            temperature: 0.3,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Sampling limits. Small values keep replies short and cheap.
    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Per-request HTTP timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send a single user message with an optional system prompt
    pub async fn send(&self, system: Option<&str>, user_message: &str) -> Result<ApiResponse, AiError> {
        let request = ApiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system,
            messages: vec![Message {
                role: "user".to_string(),
                content: user_message.to_string(),
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout(self.timeout)
                } else {
                    AiError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiError>(&body) {
                Ok(api_err) => api_err.error.message,
                Err(_) => body,
            };
            return Err(AiError::Status { status, message });
        }

        response
            .json::<ApiResponse>()
            .await
            .map_err(|e| AiError::Malformed(format!("Failed to parse response: {}", e)))
    }

    /// Extract text content from an API response
    pub fn extract_text(&self, response: &ApiResponse) -> Result<String, AiError> {
        response
            .content
            .iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text.clone()),
                ContentBlock::Other => None,
            })
            .ok_or_else(|| AiError::Malformed("No text content in response".to_string()))
    }
}

#[async_trait]
impl InsightProvider for ClaudeClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, AiError> {
        let response = self.send(Some(system), prompt).await?;
        tracing::debug!(
            stop_reason = response.stop_reason.as_deref().unwrap_or("unknown"),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Claude response received"
        );
        Ok(Completion {
            text: self.extract_text(&response)?,
            tokens: response.usage.input_tokens + response.usage.output_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ClaudeClient {
        ClaudeClient::new("test-key".to_string())
            .with_base_url(&server.uri())
            .with_timeout(Duration::from_millis(500))
    }

    #[tokio::test]
    async fn completes_with_text_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "content": [
                    {"type": "thinking", "thinking": "..."},
                    {"type": "text", "text": "{\"condition\": \"Gastritis\"}"}
                ],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 40, "output_tokens": 12}
            })))
            .mount(&server)
            .await;

        let completion = client(&server).complete("system", "prompt").await.unwrap();
        assert_eq!(completion.text, "{\"condition\": \"Gastritis\"}");
        assert_eq!(completion.tokens, 52);
    }

    #[tokio::test]
    async fn maps_api_errors_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "type": "error",
                "error": {"type": "rate_limit_error", "message": "Too many requests"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).complete("s", "p").await.unwrap_err();
        assert_eq!(
            err,
            AiError::Status {
                status: 429,
                message: "Too many requests".to_string()
            }
        );
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({"content": []})),
            )
            .mount(&server)
            .await;

        let err = client(&server).complete("s", "p").await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test]
    async fn response_without_text_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
            .mount(&server)
            .await;

        let err = client(&server).complete("s", "p").await.unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }
}

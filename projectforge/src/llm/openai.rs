//! HTTP provider for OpenAI-compatible chat-completion endpoints.
//!
//! Gemini exposes the same protocol, so one client covers both default
//! providers.

use super::{ChatRequest, LlmProvider, LlmResponse};
use crate::errors::LlmError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Settings for [`OpenAiCompatProvider`].
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    /// Bearer token.
    pub api_key: String,
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
    /// Provider name reported in responses.
    pub provider_name: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Chat-completion client for OpenAI-compatible APIs.
#[derive(Debug, Clone)]
pub struct OpenAiCompatProvider {
    config: OpenAiCompatConfig,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Creates a new provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::InvalidRequest(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|e| LlmError::InvalidRequest(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn build_payload(request: &ChatRequest) -> Value {
        let mut payload = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
        });
        if let Some(temp) = request.temperature {
            payload["temperature"] = serde_json::json!(temp);
        }
        if let Some(max_tokens) = request.max_tokens {
            payload["max_tokens"] = serde_json::json!(max_tokens);
        }
        payload
    }

    fn parse_response(&self, body: &Value) -> Result<LlmResponse, LlmError> {
        let choice = body
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))?;

        let content = choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::InvalidResponse("choice has no message content".to_string()))?
            .to_string();

        let finish_reason = choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .map(str::to_string);

        let usage = body.get("usage");
        let token = |field: &str| {
            usage
                .and_then(|u| u.get(field))
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
        };

        Ok(LlmResponse {
            content,
            model: body
                .get("model")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            provider: self.config.provider_name.clone(),
            input_tokens: token("prompt_tokens"),
            output_tokens: token("completion_tokens"),
            latency_ms: None,
            finish_reason,
        })
    }

    fn map_error(status: u16, retry_after: Option<u64>, body: &str) -> LlmError {
        match status {
            401 | 403 => LlmError::Authentication(body.to_string()),
            429 => LlmError::RateLimited { retry_after },
            _ => LlmError::Api {
                status,
                message: body.to_string(),
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.config.provider_name
    }

    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .headers(self.build_headers()?)
            .json(&Self::build_payload(&request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(Self::map_error(status, retry_after, &text));
        }

        let body: Value =
            serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let mut parsed = self.parse_response(&body)?;
        parsed.latency_ms = Some(start.elapsed().as_secs_f64() * 1000.0);

        tracing::debug!(
            provider = %self.config.provider_name,
            model = %parsed.model,
            total_tokens = parsed.total_tokens(),
            latency_ms = parsed.latency_ms,
            "chat completion finished"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    fn provider() -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(OpenAiCompatConfig {
            api_key: "key".into(),
            base_url: "https://example.test/v1/".into(),
            provider_name: "gemini".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_trims_slash() {
        assert_eq!(provider().endpoint(), "https://example.test/v1/chat/completions");
    }

    #[test]
    fn test_payload_shape() {
        let req = ChatRequest::new("gemini-2.5-flash", vec![ChatMessage::user("hi")])
            .with_temperature(Some(0.5));
        let payload = OpenAiCompatProvider::build_payload(&req);
        assert_eq!(payload["model"], "gemini-2.5-flash");
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["messages"][0]["content"], "hi");
        assert_eq!(payload["temperature"], 0.5);
        assert!(payload.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_response() {
        let body = serde_json::json!({
            "model": "gemini-2.5-flash",
            "choices": [{"message": {"role": "assistant", "content": "## Plan"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 30}
        });
        let resp = provider().parse_response(&body).unwrap();
        assert_eq!(resp.content, "## Plan");
        assert_eq!(resp.provider, "gemini");
        assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
        assert_eq!(resp.total_tokens(), 42);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let err = provider().parse_response(&serde_json::json!({})).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn test_map_error() {
        assert!(matches!(
            OpenAiCompatProvider::map_error(401, None, "no"),
            LlmError::Authentication(_)
        ));
        assert!(matches!(
            OpenAiCompatProvider::map_error(429, Some(3), ""),
            LlmError::RateLimited { retry_after: Some(3) }
        ));
        let err = OpenAiCompatProvider::map_error(503, None, "busy");
        assert!(err.is_retryable());
    }
}

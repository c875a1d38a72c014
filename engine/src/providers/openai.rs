//! OpenAI chat completion and embedding provider

use async_trait::async_trait;
use tracing::debug;

use shared::{GenerateRequest, GenerateResponse, ProviderError};

use crate::traits::Provider;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

pub struct OpenAiProvider {
    api_key: String,
    model: String,
    embedding_model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            embedding_model: embedding_model.into(),
            client: reqwest::Client::new(),
        }
    }
}

fn map_status(status: reqwest::StatusCode) -> ProviderError {
    match status.as_u16() {
        401 => ProviderError::AuthenticationFailed,
        429 => ProviderError::RateLimitExceeded,
        503 => ProviderError::ServiceUnavailable,
        _ => ProviderError::Server(status.to_string()),
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": request.prompt}));

        let request_body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature
        });

        debug!(model = %self.model, "sending chat completion request");
        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(map_status(response.status()));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidRequest(format!("Failed to parse response: {e}")))?;

        let content = response_json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| ProviderError::InvalidRequest("No content in response".to_string()))?;

        let tokens_used = response_json
            .get("usage")
            .and_then(|u| u.get("total_tokens"))
            .and_then(|t| t.as_u64())
            .unwrap_or(0) as u32;

        Ok(GenerateResponse {
            content: content.to_string(),
            model: self.model.clone(),
            tokens_used,
        })
    }

    async fn get_embedding(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let request_body = serde_json::json!({
            "model": self.embedding_model,
            "input": text
        });

        let response = self
            .client
            .post(EMBEDDINGS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(map_status(response.status()));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidRequest(format!("Failed to parse response: {e}")))?;

        let embedding: Vec<f32> = response_json
            .get("data")
            .and_then(|data| data.get(0))
            .and_then(|item| item.get("embedding"))
            .and_then(|e| e.as_array())
            .ok_or_else(|| ProviderError::InvalidRequest("No embedding in response".to_string()))?
            .iter()
            .filter_map(|v| v.as_f64())
            .map(|v| v as f32)
            .collect();

        if embedding.is_empty() {
            return Err(ProviderError::EmptyEmbedding);
        }
        Ok(embedding)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn supports_embeddings(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_requires_api_key() {
        let provider = OpenAiProvider::new("", "gpt-4o-mini", "text-embedding-3-small");
        assert!(!provider.is_available());

        let provider = OpenAiProvider::new("sk-test", "gpt-4o-mini", "text-embedding-3-small");
        assert!(provider.is_available());
        assert!(provider.supports_embeddings());
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            map_status(reqwest::StatusCode::UNAUTHORIZED),
            ProviderError::AuthenticationFailed
        );
        assert_eq!(
            map_status(reqwest::StatusCode::TOO_MANY_REQUESTS),
            ProviderError::RateLimitExceeded
        );
        assert_eq!(
            map_status(reqwest::StatusCode::SERVICE_UNAVAILABLE),
            ProviderError::ServiceUnavailable
        );
        assert!(matches!(
            map_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            ProviderError::Server(_)
        ));
    }
}

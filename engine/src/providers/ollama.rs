//! Local Ollama provider
//!
//! Talks to a local Ollama daemon over its HTTP API. Always reported as
//! available; an unreachable daemon surfaces as a network error at call
//! time.

use async_trait::async_trait;
use tracing::debug;

use shared::{GenerateRequest, GenerateResponse, ProviderError};

use crate::traits::Provider;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, model)
    }

    pub fn with_base_url(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let full_prompt = match &request.system_prompt {
            Some(system) => format!("{system}\n\n{}", request.prompt),
            None => request.prompt.clone(),
        };

        let request_body = serde_json::json!({
            "model": self.model,
            "prompt": full_prompt,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens
            }
        });

        debug!(model = %self.model, "sending ollama generate request");
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Server(response.status().to_string()));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidRequest(format!("Failed to parse response: {e}")))?;

        let content = response_json
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or_else(|| ProviderError::InvalidRequest("No content in response".to_string()))?;

        let tokens_used = response_json
            .get("eval_count")
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
            "model": self.model,
            "prompt": text
        });

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Server(response.status().to_string()));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidRequest(format!("Failed to parse response: {e}")))?;

        let embedding: Vec<f32> = response_json
            .get("embedding")
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
        "ollama"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn supports_embeddings(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let provider = OllamaProvider::new("llama3:8b");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(provider.name(), "ollama");
        assert!(provider.is_available());
        assert!(provider.supports_embeddings());
    }

    #[test]
    fn test_custom_base_url() {
        let provider = OllamaProvider::with_base_url("http://10.0.0.2:11434", "llama3:8b");
        assert_eq!(provider.base_url, "http://10.0.0.2:11434");
    }
}

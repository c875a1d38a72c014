//! Shared test doubles and fixtures for integration tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use engine::Provider;
use shared::{CandidatePrompt, GenerateRequest, GenerateResponse, ProviderError};

/// A provider that replays a scripted sequence of generation responses
/// and serves embeddings from a fixed lookup table. Every generation
/// request is recorded for later assertions.
pub struct ScriptedProvider {
    name: String,
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    embeddings: Mutex<HashMap<String, Vec<f32>>>,
    pub requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: Mutex::new(VecDeque::new()),
            embeddings: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful generation response
    pub fn push_response(&self, content: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(content.to_string()));
    }

    /// Queue a generation failure
    pub fn push_error(&self, error: ProviderError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Register the embedding returned for an exact text
    pub fn set_embedding(&self, text: &str, embedding: Vec<f32>) {
        self.embeddings
            .lock()
            .unwrap()
            .insert(text.to_string(), embedding);
    }

    pub fn recorded_requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);

        let scripted = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::InvalidRequest(
                    "scripted responses exhausted".to_string(),
                ))
            });

        scripted.map(|content| GenerateResponse {
            content,
            model: "scripted".to_string(),
            tokens_used: 42,
        })
    }

    async fn get_embedding(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.embeddings
            .lock()
            .unwrap()
            .get(text)
            .cloned()
            .ok_or(ProviderError::EmptyEmbedding)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        true
    }

    fn supports_embeddings(&self) -> bool {
        true
    }
}

pub fn candidate(content: &str, temperature: f64) -> CandidatePrompt {
    CandidatePrompt::new(content, "pre_analysis", "openai", temperature)
}

/// A minimal valid judge response with the given overall score
pub fn evaluation_json(score: f64) -> String {
    format!(
        r#"{{"overall_score": {score}, "criteria_scores": {{"helpfulness": {score}}}, "reasoning": "scripted evaluation", "improvements": ["be clearer"]}}"#
    )
}

/// A well-formed refinement response producing the given prompt
pub fn refinement_response(improved_prompt: &str) -> String {
    format!("REASONING: scripted improvement\n\nIMPROVED PROMPT:\n{improved_prompt}")
}

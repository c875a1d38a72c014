//! Judge entry point: build prompt, call provider, parse, detect bias

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use shared::{EvaluationResult, GenerateRequest, PromptEvaluationRequest};

use crate::error::{EngineError, EngineResult};
use crate::traits::Provider;

use super::bias::{self, BiasCheck, BiasConfig};
use super::parsing;
use super::prompts;

const EVALUATION_MAX_TOKENS: u32 = 2000;

/// LLM-backed evaluator for prompt/response pairs
pub struct LlmJudge {
    provider: Arc<dyn Provider>,
    bias_checks: Vec<BiasCheck>,
}

impl LlmJudge {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self::with_bias_config(provider, BiasConfig::default())
    }

    /// Create a judge with explicit bias detection thresholds
    pub fn with_bias_config(provider: Arc<dyn Provider>, config: BiasConfig) -> Self {
        Self {
            provider,
            bias_checks: bias::default_checks(config),
        }
    }

    /// Evaluate a prompt/response pair against the request's criteria.
    ///
    /// Fails only when the provider call itself fails; malformed judge
    /// output is resolved by the parsing chain or synthesized fallback.
    pub async fn evaluate(
        &self,
        request: &PromptEvaluationRequest,
    ) -> EngineResult<EvaluationResult> {
        info!(model_family = %request.model_family, "starting prompt evaluation");
        let started = Instant::now();
        let started_at = Utc::now();

        let evaluation_prompt = prompts::build_evaluation_prompt(request);
        debug!(prompt_length = evaluation_prompt.len(), "built evaluation prompt");

        let response = self
            .provider
            .generate(GenerateRequest {
                prompt: evaluation_prompt,
                system_prompt: None,
                // Deterministic evaluation is the point of a judge
                temperature: 0.0,
                max_tokens: EVALUATION_MAX_TOKENS,
            })
            .await
            .map_err(EngineError::Evaluation)?;

        let mut result = parsing::parse_evaluation_response(&response.content, request);
        bias::detect(&self.bias_checks, request, &mut result);

        result.model_family = request.model_family;
        result.evaluation_time = started_at;
        result.processing_duration = started.elapsed();

        info!(
            overall_score = result.overall_score,
            duration_ms = result.processing_duration.as_millis() as u64,
            "prompt evaluation completed"
        );
        Ok(result)
    }
}

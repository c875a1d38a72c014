//! Meta-prompt optimization
//!
//! Iterative generate → evaluate → refine loop: the judge scores the
//! current prompt, a meta-prompt asks the provider for an improved
//! version, and the loop stops on convergence (target score reached) or
//! when the iteration budget runs out. Strictly sequential; each
//! iteration depends on the previous evaluation.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use shared::{
    default_code_criteria, EvaluationCriteria, EvaluationResult, GenerateRequest,
    OptimizationExample, OptimizationIteration, OptimizationRequest, OptimizationResult,
    PromptEvaluationRequest,
};
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::judge::LlmJudge;
use crate::traits::Provider;

const TEST_RESPONSE_MAX_TOKENS: u32 = 1000;
const REFINEMENT_MAX_TOKENS: u32 = 2000;

/// Automated prompt optimizer driven by LLM feedback
pub struct MetaPromptOptimizer {
    provider: Arc<dyn Provider>,
    judge: LlmJudge,
}

impl MetaPromptOptimizer {
    /// Create an optimizer; `judge_provider` may differ from the
    /// generation provider to keep evaluation independent.
    pub fn new(provider: Arc<dyn Provider>, judge_provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            judge: LlmJudge::new(judge_provider),
        }
    }

    /// Run the optimization loop described by the request.
    ///
    /// The result reports the best prompt seen, which may be the
    /// original if no iteration improved on it; `improvement` can be
    /// zero or negative and the caller decides whether to discard.
    pub async fn optimize(
        &self,
        request: &OptimizationRequest,
    ) -> EngineResult<OptimizationResult> {
        info!(
            max_iterations = request.max_iterations,
            target_score = request.target_score,
            "starting prompt optimization"
        );
        let started = Instant::now();

        let criteria = optimization_criteria(request);

        let (original_score, mut current_eval) = self
            .evaluate_prompt(&request.original_prompt, request, &criteria)
            .await
            .map_err(|e| EngineError::OriginalEvaluation(Box::new(e)))?;

        let mut best_score = original_score;
        let mut best_prompt = request.original_prompt.clone();
        let mut current_prompt = request.original_prompt.clone();
        let mut iterations = Vec::new();
        let mut converged_at = -1;

        for i in 1..=request.max_iterations {
            info!(iteration = i, "starting optimization iteration");
            let iteration_started = Instant::now();

            let (improved_prompt, change_reasoning) = self
                .generate_improved_prompt(&current_prompt, &current_eval, request)
                .await
                .map_err(|source| EngineError::Refinement { iteration: i, source })?;

            let (score, evaluation) = self
                .evaluate_prompt(&improved_prompt, request, &criteria)
                .await
                .map_err(|e| EngineError::IterationEvaluation {
                    iteration: i,
                    source: Box::new(e),
                })?;

            iterations.push(OptimizationIteration {
                iteration: i,
                prompt: improved_prompt.clone(),
                score,
                evaluation: evaluation.clone(),
                change_reasoning,
                processing_time: iteration_started.elapsed(),
            });

            if score > best_score {
                info!(score, "found improved prompt");
                best_score = score;
                best_prompt = improved_prompt.clone();
            }

            if score >= request.target_score {
                info!(target_score = request.target_score, "target score reached, stopping");
                converged_at = i as i32;
                break;
            }

            current_prompt = improved_prompt;
            current_eval = evaluation;
        }

        info!(
            final_score = best_score,
            improvement = best_score - original_score,
            "prompt optimization finished"
        );
        Ok(OptimizationResult {
            optimized_prompt: best_prompt,
            original_score,
            final_score: best_score,
            improvement: best_score - original_score,
            iterations,
            converged_at,
            total_time: started.elapsed(),
        })
    }

    /// Score a prompt: generate a test response with it, then judge the pair
    async fn evaluate_prompt(
        &self,
        prompt: &str,
        request: &OptimizationRequest,
        criteria: &HashMap<String, EvaluationCriteria>,
    ) -> EngineResult<(f64, EvaluationResult)> {
        let test_response = self.generate_test_response(prompt, request).await?;

        let eval_request = PromptEvaluationRequest {
            original_prompt: prompt.to_string(),
            generated_response: test_response,
            reference_answer: None,
            criteria: criteria.clone(),
            model_family: request.model_family,
            persona_type: request.persona_type,
        };

        let evaluation = self.judge.evaluate(&eval_request).await?;
        Ok((evaluation.overall_score, evaluation))
    }

    /// Exercise the prompt against the best available worked example,
    /// or the task description when no examples exist.
    async fn generate_test_response(
        &self,
        prompt: &str,
        request: &OptimizationRequest,
    ) -> EngineResult<String> {
        let test_input = best_example(&request.examples)
            .map(|example| example.input.as_str())
            .unwrap_or(&request.task_description);

        let full_prompt = format!("{prompt}\n\nTask: {test_input}");
        debug!(prompt_length = full_prompt.len(), "generating test response");

        let response = self
            .provider
            .generate(GenerateRequest {
                prompt: full_prompt,
                system_prompt: None,
                // Low temperature keeps scoring comparable across iterations
                temperature: 0.3,
                max_tokens: TEST_RESPONSE_MAX_TOKENS,
            })
            .await
            .map_err(EngineError::TestResponse)?;

        Ok(response.content)
    }

    /// Ask the provider for an improved prompt, returning it with the
    /// model's change reasoning.
    async fn generate_improved_prompt(
        &self,
        current_prompt: &str,
        evaluation: &EvaluationResult,
        request: &OptimizationRequest,
    ) -> Result<(String, String), shared::ProviderError> {
        let meta_prompt = build_meta_prompt(current_prompt, evaluation, request);

        let response = self
            .provider
            .generate(GenerateRequest {
                prompt: meta_prompt,
                system_prompt: None,
                // Higher creativity for prompt rewriting
                temperature: 0.7,
                max_tokens: REFINEMENT_MAX_TOKENS,
            })
            .await?;

        Ok(parse_meta_prompt_response(&response.content))
    }
}

/// Default code criteria reweighted by the request's optimization goals
fn optimization_criteria(request: &OptimizationRequest) -> HashMap<String, EvaluationCriteria> {
    let mut criteria = default_code_criteria();
    for (name, weight) in &request.optimization_goals {
        if let Some(criterion) = criteria.get_mut(name) {
            criterion.weight = *weight;
        }
    }
    criteria
}

/// The highest-quality worked example, used as a few-shot anchor
fn best_example(examples: &[OptimizationExample]) -> Option<&OptimizationExample> {
    examples.iter().max_by(|a, b| {
        a.quality
            .partial_cmp(&b.quality)
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

fn build_meta_prompt(
    current_prompt: &str,
    evaluation: &EvaluationResult,
    request: &OptimizationRequest,
) -> String {
    let improvements = evaluation.improvements.join("\n- ");
    let constraints = request.constraints.join("\n- ");
    let examples = format_examples(&request.examples);

    format!(
        "You are an expert prompt engineer specializing in {persona} tasks. Your job is to improve prompts to achieve better performance.\n\n\
        Current Prompt:\n\"\"\"\n{current_prompt}\n\"\"\"\n\n\
        Evaluation Results:\n\
        - Overall Score: {score:.1}/10\n\
        - Specific Improvements Needed:\n{improvements}\n\n\
        Task Description: {task}\n\n\
        Constraints:\n\
        - {constraints}\n\
        - Maintain the core intent and functionality\n\
        - Only make necessary improvements\n\
        - Ensure clarity and specificity\n\n\
        Examples (if available):\n{examples}\n\n\
        Please provide an improved version of the prompt that addresses the evaluation feedback.\n\n\
        FORMAT YOUR RESPONSE AS:\n\
        REASONING: [Explain your specific changes and why they improve the prompt]\n\n\
        IMPROVED PROMPT:\n\
        [Your improved prompt here]",
        persona = request.persona_type,
        score = evaluation.overall_score,
        task = request.task_description,
    )
}

/// Split a refinement response into (improved prompt, reasoning).
///
/// Responses missing the markers are used whole as the improved prompt.
fn parse_meta_prompt_response(response: &str) -> (String, String) {
    let reasoning_start = response.find("REASONING:");
    let prompt_start = response.find("IMPROVED PROMPT:");

    match (reasoning_start, prompt_start) {
        (Some(r), Some(p)) if r < p => {
            let reasoning = response[r + "REASONING:".len()..p].trim().to_string();
            let improved = response[p + "IMPROVED PROMPT:".len()..].trim().to_string();
            (improved, reasoning)
        }
        _ => (
            response.trim().to_string(),
            "No explicit reasoning provided".to_string(),
        ),
    }
}

fn format_examples(examples: &[OptimizationExample]) -> String {
    if examples.is_empty() {
        return "No examples provided".to_string();
    }

    examples
        .iter()
        .enumerate()
        .map(|(i, example)| {
            format!(
                "Example {n}:\nInput: {input}\nExpected Output: {output}\nQuality: {quality:.1}/10",
                n = i + 1,
                input = example.input,
                output = example.expected_output,
                quality = example.quality,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

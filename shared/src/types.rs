//! Core domain types shared across the engine components

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// LLM families with distinct prompting idioms
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Claude,
    Gpt,
    Gemini,
    #[default]
    Generic,
}

impl ModelFamily {
    /// Detect the model family from a model name
    pub fn detect(model_name: &str) -> Self {
        let name = model_name.to_lowercase();
        if name.contains("claude") {
            ModelFamily::Claude
        } else if name.contains("gpt") || name.contains("o1") || name.contains("o3") {
            ModelFamily::Gpt
        } else if name.contains("gemini") {
            ModelFamily::Gemini
        } else {
            ModelFamily::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Claude => "claude",
            ModelFamily::Gpt => "gpt",
            ModelFamily::Gemini => "gemini",
            ModelFamily::Generic => "generic",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Interaction personas used to frame evaluation prompts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaType {
    Code,
    Writing,
    Analysis,
    #[default]
    Generic,
}

impl PersonaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaType::Code => "code",
            PersonaType::Writing => "writing",
            PersonaType::Analysis => "analysis",
            PersonaType::Generic => "generic",
        }
    }
}

impl fmt::Display for PersonaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A candidate prompt produced by the upstream generation pipeline.
///
/// Owned by the caller and read-only to the engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidatePrompt {
    pub content: String,
    /// Named stage of the upstream pipeline that produced this candidate
    pub phase: String,
    pub provider_name: String,
    pub temperature: f64,
    pub created_at: DateTime<Utc>,
}

impl CandidatePrompt {
    pub fn new(
        content: impl Into<String>,
        phase: impl Into<String>,
        provider_name: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self {
            content: content.into(),
            phase: phase.into(),
            provider_name: provider_name.into(),
            temperature,
            created_at: Utc::now(),
        }
    }
}

/// Per-candidate ranking output, created fresh on every ranking pass
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptRanking {
    pub candidate: CandidatePrompt,
    pub total_score: f64,
    pub temperature_score: f64,
    pub token_score: f64,
    pub semantic_score: f64,
    pub length_score: f64,
}

/// A single weighted evaluation dimension
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvaluationCriteria {
    #[serde(default)]
    pub factual_accuracy: bool,
    #[serde(default)]
    pub helpfulness: bool,
    #[serde(default)]
    pub conciseness: bool,
    #[serde(default)]
    pub code_quality: bool,
    #[serde(default)]
    pub adherence_to_style: bool,
    pub weight: f64,
}

/// Standard evaluation criteria for code generation tasks
pub fn default_code_criteria() -> HashMap<String, EvaluationCriteria> {
    let mut criteria = HashMap::new();
    criteria.insert(
        "factual_accuracy".to_string(),
        EvaluationCriteria { factual_accuracy: true, weight: 0.3, ..Default::default() },
    );
    criteria.insert(
        "code_quality".to_string(),
        EvaluationCriteria { code_quality: true, weight: 0.3, ..Default::default() },
    );
    criteria.insert(
        "helpfulness".to_string(),
        EvaluationCriteria { helpfulness: true, weight: 0.2, ..Default::default() },
    );
    criteria.insert(
        "conciseness".to_string(),
        EvaluationCriteria { conciseness: true, weight: 0.2, ..Default::default() },
    );
    criteria
}

/// Everything the judge needs to evaluate one prompt/response pair
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptEvaluationRequest {
    pub original_prompt: String,
    pub generated_response: String,
    #[serde(default)]
    pub reference_answer: Option<String>,
    pub criteria: HashMap<String, EvaluationCriteria>,
    #[serde(default)]
    pub model_family: ModelFamily,
    #[serde(default)]
    pub persona_type: PersonaType,
}

/// Structured judge output for a single prompt/response pair.
///
/// Deserialized straight from LLM JSON, so every field defaults: judges
/// routinely omit parts of the requested structure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(default)]
    pub overall_score: f64,
    #[serde(default)]
    pub criteria_scores: HashMap<String, f64>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default, alias = "bias_notes")]
    pub bias_detected: Vec<String>,
    #[serde(default)]
    pub model_family: ModelFamily,
    #[serde(default = "Utc::now")]
    pub evaluation_time: DateTime<Utc>,
    #[serde(default)]
    pub processing_duration: Duration,
}

impl Default for EvaluationResult {
    fn default() -> Self {
        Self {
            overall_score: 0.0,
            criteria_scores: HashMap::new(),
            reasoning: String::new(),
            improvements: Vec::new(),
            bias_detected: Vec::new(),
            model_family: ModelFamily::Generic,
            evaluation_time: Utc::now(),
            processing_duration: Duration::default(),
        }
    }
}

/// Parameters for an iterative prompt optimization run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub original_prompt: String,
    pub task_description: String,
    #[serde(default)]
    pub examples: Vec<OptimizationExample>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub model_family: ModelFamily,
    #[serde(default)]
    pub persona_type: PersonaType,
    pub max_iterations: u32,
    pub target_score: f64,
    #[serde(default)]
    pub optimization_goals: HashMap<String, f64>,
}

/// A worked input/output pair used to anchor refinement
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizationExample {
    pub input: String,
    pub expected_output: String,
    /// Quality score on a 1-10 scale
    pub quality: f64,
}

/// One pass of the optimization loop
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizationIteration {
    pub iteration: u32,
    pub prompt: String,
    pub score: f64,
    pub evaluation: EvaluationResult,
    pub change_reasoning: String,
    pub processing_time: Duration,
}

/// Final outcome of an optimization run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub optimized_prompt: String,
    pub original_score: f64,
    pub final_score: f64,
    pub improvement: f64,
    pub iterations: Vec<OptimizationIteration>,
    /// 1-based iteration index at which the target score was reached, or -1
    pub converged_at: i32,
    pub total_time: Duration,
}

/// A scored prompt candidate presented to the meta-judge for selection
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionCandidate {
    pub id: String,
    pub prompt: String,
    pub phase: String,
    pub provider: String,
    pub judge_score: f64,
    pub historical_score: f64,
    pub semantic_match: f64,
    /// "generated", "optimized" or "historical"
    pub source: String,
    /// Why this candidate was generated/selected upstream
    pub reasoning: String,
    /// Which generation cycle produced this candidate
    pub cycle_number: u32,
}

impl SelectionCandidate {
    /// Create a candidate with a fresh unique id
    pub fn new(prompt: impl Into<String>, phase: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            phase: phase.into(),
            provider: provider.into(),
            judge_score: 0.0,
            historical_score: 0.0,
            semantic_match: 0.0,
            source: "generated".to_string(),
            reasoning: String::new(),
            cycle_number: 0,
        }
    }
}

/// Candidates plus the context the meta-judge selects against
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub user_input: String,
    pub candidates: Vec<SelectionCandidate>,
    #[serde(default)]
    pub user_intent: String,
    #[serde(default)]
    pub task_context: String,
}

/// The meta-judge's pick, always exactly one candidate
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionResult {
    pub selected: Vec<SelectionCandidate>,
    pub reasoning: String,
    pub confidence: f64,
}

/// A single text generation request issued to a provider
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Provider output for a generation request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub content: String,
    pub model: String,
    pub tokens_used: u32,
}

//! Cascading parse strategies for judge responses
//!
//! LLM judges routinely wrap JSON in prose or markup, so parsing is an
//! ordered table of extraction strategies tried until one yields valid
//! JSON. Adding a strategy is additive: append to `STRATEGIES`. When
//! everything fails, a fallback evaluation is synthesized from numeric
//! patterns in the raw text — format problems never surface as errors.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use shared::{EvaluationResult, PromptEvaluationRequest};

/// Extracts a candidate JSON string from a raw judge response
type Extractor = fn(&str) -> Option<String>;

/// Strategies in attempt order
const STRATEGIES: &[(&str, Extractor)] = &[
    ("raw", extract_raw),
    ("json_fence", extract_json_fence),
    ("any_fence", extract_any_fence),
    ("answer_tags", extract_answer_tags),
    ("brace_span", extract_brace_span),
    ("stripped_prose", extract_stripped_prose),
];

/// Parse a judge response into a normalized evaluation result.
///
/// Never fails: runs the strategy chain, then synthesizes a fallback.
pub(crate) fn parse_evaluation_response(
    response: &str,
    request: &PromptEvaluationRequest,
) -> EvaluationResult {
    for (name, extract) in STRATEGIES {
        let Some(candidate) = extract(response) else {
            continue;
        };
        if let Some(result) = try_parse_json(&candidate) {
            debug!(strategy = name, "parsed evaluation response");
            return result;
        }
    }

    warn!("all parse strategies failed, synthesizing fallback evaluation");
    fallback_evaluation(response, request)
}

/// Parse and normalize a JSON candidate; None when it isn't valid JSON
fn try_parse_json(json_str: &str) -> Option<EvaluationResult> {
    let mut result: EvaluationResult = serde_json::from_str(json_str).ok()?;

    result.overall_score = normalize_score(result.overall_score);
    for score in result.criteria_scores.values_mut() {
        *score = normalize_score(*score);
    }
    if result.reasoning.is_empty() {
        result.reasoning = "Evaluation completed".to_string();
    }

    Some(result)
}

fn extract_raw(response: &str) -> Option<String> {
    Some(response.trim().to_string())
}

fn extract_json_fence(response: &str) -> Option<String> {
    let start = response.find("```json")? + "```json".len();
    let end = response[start..].find("```")?;
    Some(response[start..start + end].trim().to_string())
}

/// Any fenced block, stripping a short leading language tag
fn extract_any_fence(response: &str) -> Option<String> {
    if !response.contains("```") {
        return None;
    }
    let parts: Vec<&str> = response.split("```").collect();
    for part in parts.iter().skip(1).step_by(2) {
        let mut block = part.trim();
        if let Some(idx) = block.find('\n') {
            if idx > 0 && idx < 20 {
                block = block[idx + 1..].trim();
            }
        }
        if serde_json::from_str::<serde_json::Value>(block).is_ok() {
            return Some(block.to_string());
        }
    }
    None
}

fn extract_answer_tags(response: &str) -> Option<String> {
    let start = response.find("<answer>")? + "<answer>".len();
    let end = response[start..].find("</answer>")?;
    Some(response[start..start + end].trim().to_string())
}

fn extract_brace_span(response: &str) -> Option<String> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    Some(response[start..=end].trim().to_string())
}

const PROSE_PREFIXES: &[&str] = &[
    "here's the evaluation:",
    "here is the evaluation:",
    "```json",
    "```",
    "based on the criteria:",
    "evaluation:",
];

const PROSE_SUFFIXES: &[&str] = &[
    "```",
    "this evaluation considers all the specified criteria.",
    "i hope this evaluation is helpful.",
];

/// Strip known LLM prose wrappers, then take the brace span of what's left
fn extract_stripped_prose(response: &str) -> Option<String> {
    let mut cleaned = response.trim();

    for prefix in PROSE_PREFIXES {
        if cleaned.to_lowercase().starts_with(prefix) {
            cleaned = cleaned[prefix.len()..].trim();
        }
    }
    for suffix in PROSE_SUFFIXES {
        if cleaned.to_lowercase().ends_with(suffix) {
            cleaned = cleaned[..cleaned.len() - suffix.len()].trim();
        }
    }

    extract_brace_span(cleaned).or_else(|| Some(cleaned.to_string()))
}

/// Synthesize an evaluation from numeric patterns in unparseable text
fn fallback_evaluation(response: &str, request: &PromptEvaluationRequest) -> EvaluationResult {
    let score = extract_numeric_score(response);

    let mut result = EvaluationResult {
        overall_score: score,
        reasoning: format!("Fallback evaluation - original response: {response}"),
        improvements: vec![
            "Improve response format".to_string(),
            "Ensure JSON compliance".to_string(),
        ],
        ..EvaluationResult::default()
    };

    for name in request.criteria.keys() {
        result.criteria_scores.insert(name.clone(), score);
    }

    result
}

lazy_static! {
    static ref SCORE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)score:\s*(\d+\.?\d*)").unwrap(),
        Regex::new(r"(?i)(\d+)/10").unwrap(),
        Regex::new(r"(?i)(\d+\.?\d*)\s*/\s*10").unwrap(),
        Regex::new(r"(?i)overall:\s*(\d+\.?\d*)").unwrap(),
        Regex::new(r"(?i)(\d+\.?\d*)\s*out\s*of\s*10").unwrap(),
    ];
}

/// Find a plausible numeric score in free text, defaulting to 6.0
pub fn extract_numeric_score(text: &str) -> f64 {
    for pattern in SCORE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Ok(score) = captures[1].parse::<f64>() {
                return normalize_score(score);
            }
        }
    }
    6.0
}

/// Clamp a score into the [0,10] range
pub fn normalize_score(score: f64) -> f64 {
    score.clamp(0.0, 10.0)
}

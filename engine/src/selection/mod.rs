//! Meta-judge candidate selection
//!
//! An LLM picks the best prompt from a set of scored candidates. The
//! judge answers in a line-oriented SELECTED_ID / CONFIDENCE / REASONING
//! format; anything it gets wrong degrades through an ordered fallback
//! table instead of failing, so selection always returns a candidate
//! when at least one exists.

use std::sync::Arc;

use tracing::{info, warn};

use shared::{GenerateRequest, SelectionCandidate, SelectionRequest, SelectionResult};

use crate::error::{EngineError, EngineResult};
use crate::traits::Provider;

const SELECTION_MAX_TOKENS: u32 = 2000;
const DEFAULT_CONFIDENCE: f64 = 0.85;

const JUDGE_SYSTEM_PROMPT: &str = "You are an expert prompt engineering judge. \
    Select the candidate prompt that will best serve the user's needs. \
    Consider relevance, clarity, specificity and past performance. \
    Respond only in the requested format.";

/// How to resolve a selection when the judge's answer can't be used directly
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FallbackRule {
    /// Use the candidate whose id the judge named
    MatchedId,
    /// Highest judge score among candidates that have one
    HighestJudgeScore,
    /// Last resort, the first candidate in request order
    FirstCandidate,
}

const FALLBACK_ORDER: &[FallbackRule] = &[
    FallbackRule::MatchedId,
    FallbackRule::HighestJudgeScore,
    FallbackRule::FirstCandidate,
];

/// LLM-backed selector choosing one winner from scored candidates
pub struct MetaJudge {
    provider: Arc<dyn Provider>,
}

impl MetaJudge {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Select the single best candidate for the request.
    ///
    /// Returns `EngineError::NoCandidates` for an empty candidate set;
    /// provider failures surface as `EngineError::Selection`.
    pub async fn select_best(&self, request: &SelectionRequest) -> EngineResult<SelectionResult> {
        if request.candidates.is_empty() {
            return Err(EngineError::NoCandidates);
        }

        info!(
            candidates = request.candidates.len(),
            "running meta-judge selection"
        );

        let prompt = build_selection_prompt(request);
        let response = self
            .provider
            .generate(GenerateRequest {
                prompt,
                system_prompt: Some(JUDGE_SYSTEM_PROMPT.to_string()),
                temperature: 0.3,
                max_tokens: SELECTION_MAX_TOKENS,
            })
            .await
            .map_err(EngineError::Selection)?;

        let parsed = parse_selection_response(&response.content);
        Ok(resolve_selection(&request.candidates, parsed))
    }
}

/// What the judge's free-text answer yielded
#[derive(Debug, Default, PartialEq)]
struct ParsedSelection {
    selected_id: Option<String>,
    confidence: f64,
    reasoning: String,
}

fn build_selection_prompt(request: &SelectionRequest) -> String {
    let mut candidates = String::new();
    for (i, candidate) in request.candidates.iter().enumerate() {
        candidates.push_str(&format!(
            "Candidate {n} (ID: {id}):\n\
            Source: {source} (Cycle {cycle})\n\
            Phase: {phase}\n\
            Provider: {provider}\n\
            Judge Score: {judge:.1}/10\n\
            Historical Score: {historical:.1}/10\n\
            Semantic Match: {semantic:.2}\n\
            Reasoning: {reasoning}\n\
            Prompt:\n{prompt}\n\n",
            n = i + 1,
            id = candidate.id,
            source = candidate.source,
            cycle = candidate.cycle_number,
            phase = candidate.phase,
            provider = candidate.provider,
            judge = candidate.judge_score,
            historical = candidate.historical_score,
            semantic = candidate.semantic_match,
            reasoning = candidate.reasoning,
            prompt = candidate.prompt,
        ));
    }

    format!(
        "Select the best prompt candidate for the user's request.\n\n\
        User Request: {user_input}\n\
        User Intent: {user_intent}\n\
        Task Context: {task_context}\n\n\
        Candidates:\n\n{candidates}\
        Selection criteria:\n\
        1. Relevance to the user's actual request\n\
        2. Clarity and specificity of instructions\n\
        3. Judge and historical scores\n\
        4. Semantic match with the user's intent\n\n\
        REQUIRED OUTPUT FORMAT:\n\
        SELECTED_ID: [the ID of your chosen candidate]\n\
        CONFIDENCE: [0.0-1.0]\n\
        REASONING: [why this candidate is the best choice]",
        user_input = request.user_input,
        user_intent = request.user_intent,
        task_context = request.task_context,
    )
}

/// Line-oriented scan for the three expected markers.
///
/// Missing or malformed fields degrade individually: no id means the
/// fallback table decides, an out-of-range confidence reverts to the
/// default, reasoning collects every line after its marker.
fn parse_selection_response(response: &str) -> ParsedSelection {
    let mut parsed = ParsedSelection {
        confidence: DEFAULT_CONFIDENCE,
        ..Default::default()
    };

    let mut reasoning_lines: Vec<&str> = Vec::new();
    let mut in_reasoning = false;

    for line in response.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("SELECTED_ID:") {
            let id = rest.trim().trim_matches(|c| c == '[' || c == ']').trim();
            if !id.is_empty() {
                parsed.selected_id = Some(id.to_string());
            }
            in_reasoning = false;
        } else if let Some(rest) = trimmed.strip_prefix("CONFIDENCE:") {
            if let Ok(value) = rest.trim().parse::<f64>() {
                if value > 0.0 && value <= 1.0 {
                    parsed.confidence = value;
                }
            }
            in_reasoning = false;
        } else if let Some(rest) = trimmed.strip_prefix("REASONING:") {
            let rest = rest.trim();
            if !rest.is_empty() {
                reasoning_lines.push(rest);
            }
            in_reasoning = true;
        } else if in_reasoning && !trimmed.is_empty() {
            reasoning_lines.push(trimmed);
        }
    }

    parsed.reasoning = reasoning_lines.join(" ");
    parsed
}

/// Walk the fallback table until a rule produces a winner
fn resolve_selection(
    candidates: &[SelectionCandidate],
    parsed: ParsedSelection,
) -> SelectionResult {
    for rule in FALLBACK_ORDER {
        match rule {
            FallbackRule::MatchedId => {
                if let Some(id) = &parsed.selected_id {
                    if let Some(winner) = candidates.iter().find(|c| &c.id == id) {
                        info!(id = %winner.id, "meta-judge selected candidate by id");
                        return SelectionResult {
                            selected: vec![winner.clone()],
                            reasoning: if parsed.reasoning.is_empty() {
                                "Selected by meta-judge".to_string()
                            } else {
                                parsed.reasoning
                            },
                            confidence: parsed.confidence,
                        };
                    }
                    warn!(id = %id, "meta-judge named an unknown candidate id");
                }
            }
            FallbackRule::HighestJudgeScore => {
                let scored = candidates
                    .iter()
                    .filter(|c| c.judge_score > 0.0)
                    .max_by(|a, b| {
                        a.judge_score
                            .partial_cmp(&b.judge_score)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    });
                if let Some(winner) = scored {
                    warn!(id = %winner.id, "falling back to highest judge score");
                    return SelectionResult {
                        selected: vec![winner.clone()],
                        reasoning: "Selected based on highest judge score (fallback)".to_string(),
                        confidence: DEFAULT_CONFIDENCE,
                    };
                }
            }
            FallbackRule::FirstCandidate => {
                // Callers guarantee a non-empty candidate list
                if let Some(winner) = candidates.first() {
                    warn!(id = %winner.id, "falling back to first candidate");
                    return SelectionResult {
                        selected: vec![winner.clone()],
                        reasoning: "Selected first candidate (fallback)".to_string(),
                        confidence: DEFAULT_CONFIDENCE,
                    };
                }
            }
        }
    }

    // Unreachable with a non-empty list; keep the compiler satisfied
    SelectionResult {
        selected: Vec::new(),
        reasoning: String::new(),
        confidence: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, judge_score: f64) -> SelectionCandidate {
        SelectionCandidate {
            id: id.to_string(),
            judge_score,
            ..SelectionCandidate::new("prompt", "refine", "openai")
        }
    }

    #[test]
    fn test_parse_well_formed_response() {
        let response = "SELECTED_ID: cand-2\nCONFIDENCE: 0.9\nREASONING: most specific\nand clearest";
        let parsed = parse_selection_response(response);
        assert_eq!(parsed.selected_id.as_deref(), Some("cand-2"));
        assert_eq!(parsed.confidence, 0.9);
        assert_eq!(parsed.reasoning, "most specific and clearest");
    }

    #[test]
    fn test_parse_strips_bracket_placeholders() {
        let parsed = parse_selection_response("SELECTED_ID: [cand-1]\nCONFIDENCE: 1.0");
        assert_eq!(parsed.selected_id.as_deref(), Some("cand-1"));
        assert_eq!(parsed.confidence, 1.0);
    }

    #[test]
    fn test_out_of_range_confidence_reverts_to_default() {
        let parsed = parse_selection_response("SELECTED_ID: x\nCONFIDENCE: 3.5");
        assert_eq!(parsed.confidence, DEFAULT_CONFIDENCE);

        let parsed = parse_selection_response("SELECTED_ID: x\nCONFIDENCE: not a number");
        assert_eq!(parsed.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_matched_id_wins() {
        let candidates = vec![candidate("a", 5.0), candidate("b", 9.0), candidate("c", 3.0)];
        let parsed = ParsedSelection {
            selected_id: Some("c".to_string()),
            confidence: 0.7,
            reasoning: "best fit".to_string(),
        };

        let result = resolve_selection(&candidates, parsed);
        assert_eq!(result.selected[0].id, "c");
        assert_eq!(result.confidence, 0.7);
        assert_eq!(result.reasoning, "best fit");
    }

    #[test]
    fn test_malformed_response_falls_back_to_highest_judge_score() {
        let candidates = vec![candidate("a", 5.0), candidate("b", 9.0), candidate("c", 3.0)];
        let parsed = parse_selection_response("I think candidate b is great!");

        let result = resolve_selection(&candidates, parsed);
        assert_eq!(result.selected[0].id, "b");
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
        assert!(result.reasoning.contains("fallback"));
    }

    #[test]
    fn test_unknown_id_falls_back_to_highest_judge_score() {
        let candidates = vec![candidate("a", 5.0), candidate("b", 9.0)];
        let parsed = ParsedSelection {
            selected_id: Some("nope".to_string()),
            confidence: 0.9,
            reasoning: String::new(),
        };

        let result = resolve_selection(&candidates, parsed);
        assert_eq!(result.selected[0].id, "b");
    }

    #[test]
    fn test_all_unscored_candidates_fall_back_to_first() {
        let candidates = vec![candidate("a", 0.0), candidate("b", 0.0)];
        let result = resolve_selection(&candidates, ParsedSelection::default());
        assert_eq!(result.selected[0].id, "a");
        assert_eq!(result.reasoning, "Selected first candidate (fallback)");
    }

    #[test]
    fn test_selection_prompt_includes_candidate_metadata() {
        let mut c = candidate("cand-1", 8.5);
        c.source = "optimized".to_string();
        c.cycle_number = 2;
        let request = SelectionRequest {
            user_input: "sort a vec".to_string(),
            candidates: vec![c],
            user_intent: "code help".to_string(),
            task_context: "rust".to_string(),
        };

        let prompt = build_selection_prompt(&request);
        assert!(prompt.contains("ID: cand-1"));
        assert!(prompt.contains("Source: optimized (Cycle 2)"));
        assert!(prompt.contains("Judge Score: 8.5/10"));
        assert!(prompt.contains("SELECTED_ID:"));
    }
}

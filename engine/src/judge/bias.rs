//! Bias detection over judge output
//!
//! A registry of named predicates runs after parsing. Detection only
//! annotates `bias_detected`; it never blocks or alters scores. New
//! detectors register by appending to the list the registry builds.

use shared::{EvaluationResult, PromptEvaluationRequest};
use tracing::debug;

type Detector = Box<dyn Fn(&PromptEvaluationRequest, &EvaluationResult) -> bool + Send + Sync>;

/// Thresholds for the built-in detectors.
///
/// The defaults (500 words, score 8.0) are heuristics, not calibrated
/// constants; tune them per deployment.
#[derive(Clone, Copy, Debug)]
pub struct BiasConfig {
    /// Word count above which a high score looks verbosity-driven
    pub verbosity_word_limit: usize,
    /// Overall score above which verbosity bias is flagged
    pub verbosity_score_floor: f64,
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self {
            verbosity_word_limit: 500,
            verbosity_score_floor: 8.0,
        }
    }
}

/// A named bias detection strategy
pub struct BiasCheck {
    pub name: &'static str,
    pub description: &'static str,
    detector: Detector,
}

impl BiasCheck {
    fn new(
        name: &'static str,
        description: &'static str,
        detector: impl Fn(&PromptEvaluationRequest, &EvaluationResult) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            description,
            detector: Box::new(detector),
        }
    }
}

/// The built-in detector registry
pub(crate) fn default_checks(config: BiasConfig) -> Vec<BiasCheck> {
    vec![
        BiasCheck::new(
            "Verbosity Bias",
            "Tendency to prefer longer responses over concise ones",
            move |request, result| {
                let word_count = request.generated_response.split_whitespace().count();
                word_count > config.verbosity_word_limit
                    && result.overall_score > config.verbosity_score_floor
            },
        ),
        BiasCheck::new(
            "Position Bias",
            "Tendency to prefer the first option in comparisons",
            // Only meaningful for pairwise comparisons; this single
            // response mode never triggers it.
            |_request, _result| false,
        ),
        BiasCheck::new(
            "Fine-Grained Scoring Bias",
            "Arbitrary precision in detailed scoring scales",
            |_request, result| {
                result
                    .criteria_scores
                    .values()
                    .any(|score| !is_half_point(*score))
            },
        ),
    ]
}

/// Scores are expected on integer or half-integer boundaries
fn is_half_point(score: f64) -> bool {
    (score * 2.0).fract().abs() < f64::EPSILON
}

/// Run every check and record the names of those that fire
pub(crate) fn detect(
    checks: &[BiasCheck],
    request: &PromptEvaluationRequest,
    result: &mut EvaluationResult,
) {
    let detected: Vec<String> = checks
        .iter()
        .filter(|check| (check.detector)(request, &*result))
        .inspect(|check| {
            debug!(
                check = check.name,
                description = check.description,
                "bias detected"
            );
        })
        .map(|check| check.name.to_string())
        .collect();
    result.bias_detected = detected;
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{default_code_criteria, ModelFamily, PersonaType};

    fn request_with_response(response: String) -> PromptEvaluationRequest {
        PromptEvaluationRequest {
            original_prompt: "prompt".to_string(),
            generated_response: response,
            reference_answer: None,
            criteria: default_code_criteria(),
            model_family: ModelFamily::Generic,
            persona_type: PersonaType::Generic,
        }
    }

    fn result_with_score(overall: f64) -> EvaluationResult {
        EvaluationResult {
            overall_score: overall,
            ..Default::default()
        }
    }

    #[test]
    fn test_verbose_high_scored_response_flags_verbosity_bias() {
        let request = request_with_response("word ".repeat(600));
        let mut result = result_with_score(9.0);

        detect(&default_checks(BiasConfig::default()), &request, &mut result);
        assert!(result.bias_detected.contains(&"Verbosity Bias".to_string()));
    }

    #[test]
    fn test_over_precise_criterion_score_flags_fine_grained_bias() {
        let request = request_with_response("short response".to_string());
        let mut result = result_with_score(7.0);
        result.criteria_scores.insert("helpfulness".to_string(), 7.37);

        detect(&default_checks(BiasConfig::default()), &request, &mut result);
        assert!(result
            .bias_detected
            .contains(&"Fine-Grained Scoring Bias".to_string()));
    }

    #[test]
    fn test_concise_half_point_scores_trigger_no_bias() {
        let request = request_with_response("fifty words or so, well under the limit".to_string());
        let mut result = result_with_score(7.0);
        result.criteria_scores.insert("helpfulness".to_string(), 7.5);

        detect(&default_checks(BiasConfig::default()), &request, &mut result);
        assert!(result.bias_detected.is_empty());
    }

    #[test]
    fn test_custom_thresholds_are_honored() {
        let request = request_with_response("word ".repeat(50));
        let mut result = result_with_score(6.5);

        let config = BiasConfig {
            verbosity_word_limit: 40,
            verbosity_score_floor: 6.0,
        };
        detect(&default_checks(config), &request, &mut result);
        assert!(result.bias_detected.contains(&"Verbosity Bias".to_string()));
    }

    #[test]
    fn test_default_checks_carry_names_and_descriptions() {
        for check in default_checks(BiasConfig::default()) {
            assert!(!check.name.is_empty());
            assert!(!check.description.is_empty());
        }
    }

    #[test]
    fn test_detection_overwrites_stale_annotations() {
        let request = request_with_response("short".to_string());
        let mut result = result_with_score(5.0);
        result.bias_detected = vec!["Stale".to_string()];

        detect(&default_checks(BiasConfig::default()), &request, &mut result);
        assert!(result.bias_detected.is_empty());
    }
}

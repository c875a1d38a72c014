//! Model-family-specific evaluation prompt templates
//!
//! Each family gets a template tuned to its prompting idiom: Claude
//! favors XML tags, GPT markdown headings, Gemini conversational
//! framing. All templates demand the same JSON structure back.

use shared::{EvaluationCriteria, ModelFamily, PromptEvaluationRequest};
use std::collections::HashMap;

pub(crate) fn build_evaluation_prompt(request: &PromptEvaluationRequest) -> String {
    let criteria = criteria_description(&request.criteria);
    match request.model_family {
        ModelFamily::Claude => claude_prompt(request, &criteria),
        ModelFamily::Gpt => gpt_prompt(request, &criteria),
        ModelFamily::Gemini => gemini_prompt(request, &criteria),
        ModelFamily::Generic => generic_prompt(request, &criteria),
    }
}

/// Render the weighted criteria as a bullet list for the judge
fn criteria_description(criteria: &HashMap<String, EvaluationCriteria>) -> String {
    let mut names: Vec<_> = criteria.keys().collect();
    names.sort();

    let mut parts = Vec::with_capacity(names.len());
    for name in names {
        let criterion = &criteria[name];
        let mut description = format!("- **{name}** (weight: {:.2})", criterion.weight);
        if criterion.factual_accuracy {
            description.push_str(" - Check factual correctness");
        }
        if criterion.helpfulness {
            description.push_str(" - Assess practical usefulness");
        }
        if criterion.code_quality {
            description.push_str(" - Evaluate code structure and efficiency");
        }
        if criterion.conciseness {
            description.push_str(" - Prefer concise over verbose responses");
        }
        if criterion.adherence_to_style {
            description.push_str(" - Check adherence to the requested style");
        }
        parts.push(description);
    }
    parts.join("\n")
}

const JSON_SHAPE: &str = r#"{
  "overall_score": 7.5,
  "criteria_scores": {
    "factual_accuracy": 8.0,
    "helpfulness": 7.0,
    "code_quality": 8.0,
    "conciseness": 7.0
  },
  "reasoning": "The response correctly addresses the request...",
  "improvements": ["Be more specific about...", "Include examples of..."],
  "bias_notes": []
}"#;

fn claude_prompt(request: &PromptEvaluationRequest, criteria: &str) -> String {
    let reference_section = match &request.reference_answer {
        Some(answer) => format!("\n<reference_answer>\n{answer}\n</reference_answer>"),
        None => String::new(),
    };

    format!(
        "<instructions>\n\
        You are an expert evaluator specializing in persona: {persona}. Your task is to evaluate the quality of an AI-generated response based on specific criteria.\n\n\
        CRITICAL: Be objective and avoid verbosity bias. Concise, accurate responses are better than verbose ones.\n\n\
        <evaluation_criteria>\n{criteria}\n</evaluation_criteria>\n\n\
        Follow this evaluation process:\n\
        1. Analyze the response systematically\n\
        2. Score each criterion (1-10 scale)\n\
        3. Provide specific improvement suggestions\n\
        4. Give an overall assessment\n\n\
        IMPORTANT: Your response must be ONLY valid JSON with no additional text before or after.\n\
        </instructions>\n\n\
        <original_prompt>\n{prompt}\n</original_prompt>\n\n\
        <generated_response>\n{response}\n</generated_response>\n\
        {reference_section}\n\n\
        Provide your evaluation as a single JSON object with this exact structure:\n{JSON_SHAPE}",
        persona = request.persona_type,
        prompt = request.original_prompt,
        response = request.generated_response,
    )
}

fn gpt_prompt(request: &PromptEvaluationRequest, criteria: &str) -> String {
    let reference_section = match &request.reference_answer {
        Some(answer) => format!("\n## Reference Answer\n```\n{answer}\n```"),
        None => String::new(),
    };

    format!(
        "You are an expert evaluator for persona: {persona} responses. Evaluate the AI-generated response objectively.\n\n\
        ## Evaluation Criteria\n{criteria}\n\n\
        ## Original Prompt\n{prompt}\n\n\
        ## Generated Response\n{response}\n\
        {reference_section}\n\n\
        ## Instructions\n\
        1. Analyze each criterion systematically\n\
        2. Score each criterion from 1-10\n\
        3. Calculate an overall score\n\
        4. Provide specific improvements\n\n\
        CRITICAL: Respond with ONLY a JSON object, no additional text or markdown.\n\n\
        Example format:\n{JSON_SHAPE}",
        persona = request.persona_type,
        prompt = request.original_prompt,
        response = request.generated_response,
    )
}

fn gemini_prompt(request: &PromptEvaluationRequest, criteria: &str) -> String {
    let reference_section = match &request.reference_answer {
        Some(answer) => format!("\n\nFor reference, here's an ideal answer:\n\"{answer}\""),
        None => String::new(),
    };

    format!(
        "I need your help evaluating an AI-generated response for {persona} tasks. As an expert evaluator, please assess the quality objectively.\n\n\
        Here's why this evaluation matters: I want to improve prompt quality and ensure the AI provides valuable, accurate responses. Please evaluate as if you're an expert in {persona}.\n\n\
        Evaluation criteria to consider:\n{criteria}\n\n\
        The original prompt was:\n\"{prompt}\"\n\n\
        The AI generated this response:\n\"{response}\"\
        {reference_section}\n\n\
        Please evaluate this response by:\n\
        1. Explaining your reasoning for each criterion\n\
        2. Providing specific scores (1-10 scale)\n\
        3. Suggesting concrete improvements\n\
        4. Noting any evaluation biases you detect\n\n\
        Please format your response as valid JSON:\n{JSON_SHAPE}",
        persona = request.persona_type,
        prompt = request.original_prompt,
        response = request.generated_response,
    )
}

fn generic_prompt(request: &PromptEvaluationRequest, criteria: &str) -> String {
    let reference_section = match &request.reference_answer {
        Some(answer) => format!("\nReference Answer: {answer}"),
        None => String::new(),
    };

    format!(
        "Evaluate the following AI-generated response for {persona} tasks.\n\n\
        Criteria:\n{criteria}\n\n\
        Original Prompt: {prompt}\n\n\
        Generated Response: {response}\n\
        {reference_section}\n\n\
        Provide evaluation in JSON format:\n{JSON_SHAPE}",
        persona = request.persona_type,
        prompt = request.original_prompt,
        response = request.generated_response,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{default_code_criteria, PersonaType};

    fn request(family: ModelFamily) -> PromptEvaluationRequest {
        PromptEvaluationRequest {
            original_prompt: "Write a sort function".to_string(),
            generated_response: "fn sort() {}".to_string(),
            reference_answer: None,
            criteria: default_code_criteria(),
            model_family: family,
            persona_type: PersonaType::Code,
        }
    }

    #[test]
    fn test_claude_template_uses_tags() {
        let prompt = build_evaluation_prompt(&request(ModelFamily::Claude));
        assert!(prompt.contains("<instructions>"));
        assert!(prompt.contains("<original_prompt>"));
        assert!(prompt.contains("fn sort() {}"));
    }

    #[test]
    fn test_gpt_template_uses_markdown_headings() {
        let prompt = build_evaluation_prompt(&request(ModelFamily::Gpt));
        assert!(prompt.contains("## Evaluation Criteria"));
        assert!(!prompt.contains("<instructions>"));
    }

    #[test]
    fn test_reference_answer_included_when_present() {
        let mut req = request(ModelFamily::Generic);
        req.reference_answer = Some("the ideal answer".to_string());
        let prompt = build_evaluation_prompt(&req);
        assert!(prompt.contains("the ideal answer"));
    }

    #[test]
    fn test_criteria_description_includes_weights() {
        let prompt = build_evaluation_prompt(&request(ModelFamily::Generic));
        assert!(prompt.contains("**code_quality** (weight: 0.30)"));
        assert!(prompt.contains("Prefer concise over verbose"));
    }
}

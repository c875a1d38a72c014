//! LLM-as-a-judge evaluation
//!
//! A judge provider critiques a prompt/response pair against weighted
//! criteria at temperature 0. Responses are parsed through an ordered
//! chain of strategies and never fail on format alone; bias detection
//! annotates results without altering scores.

mod bias;
mod evaluator;
mod parsing;
mod prompts;

pub use bias::{BiasCheck, BiasConfig};
pub use evaluator::LlmJudge;
pub use parsing::{extract_numeric_score, normalize_score};

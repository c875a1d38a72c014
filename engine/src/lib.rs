//! Prompt evaluation engine
//!
//! Four cooperating components over a common provider abstraction:
//! multi-factor ranking of candidate prompts, LLM-as-judge evaluation,
//! meta-prompt optimization, and meta-judge selection. Providers plug
//! in through the `Provider` trait and are looked up by name through a
//! `ProviderRegistry`.

pub mod config;
pub mod engine;
pub mod error;
pub mod judge;
pub mod optimizer;
pub mod providers;
pub mod ranking;
pub mod selection;
pub mod traits;

// Re-export main types
pub use config::{ConfigStore, ConfigValue};
pub use engine::PromptEngine;
pub use error::{EngineError, EngineResult};
pub use judge::{BiasConfig, LlmJudge};
pub use optimizer::MetaPromptOptimizer;
pub use providers::{InMemoryRegistry, OllamaProvider, OpenAiProvider};
pub use ranking::{cosine_similarity, Ranker, RankingWeights};
pub use selection::MetaJudge;
pub use traits::{Provider, ProviderRegistry};

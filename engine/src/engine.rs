//! Top-level engine facade
//!
//! Wires the ranker, judge, optimizer and meta-judge onto a shared
//! provider registry and config store, and exposes one method per
//! operation. Callers that need finer control can construct the
//! components directly.

use std::sync::Arc;

use tracing::info;

use shared::{
    CandidatePrompt, EvaluationResult, OptimizationRequest, OptimizationResult, PromptEvaluationRequest,
    PromptRanking, SelectionRequest, SelectionResult,
};

use crate::config::ConfigStore;
use crate::error::EngineResult;
use crate::judge::LlmJudge;
use crate::optimizer::MetaPromptOptimizer;
use crate::ranking::Ranker;
use crate::selection::MetaJudge;
use crate::traits::{Provider, ProviderRegistry};

pub struct PromptEngine {
    ranker: Arc<Ranker>,
    judge: LlmJudge,
    optimizer: MetaPromptOptimizer,
    selector: MetaJudge,
}

impl PromptEngine {
    /// Build an engine around a registry for embeddings and a single
    /// provider for generation and judging.
    pub fn new(
        registry: Arc<dyn ProviderRegistry>,
        provider: Arc<dyn Provider>,
        config: Arc<ConfigStore>,
    ) -> Self {
        info!(provider = provider.name(), "initializing prompt engine");
        Self {
            ranker: Arc::new(Ranker::new(registry, config)),
            judge: LlmJudge::new(provider.clone()),
            optimizer: MetaPromptOptimizer::new(provider.clone(), provider.clone()),
            selector: MetaJudge::new(provider),
        }
    }

    /// Score and order candidate prompts against the target task
    pub async fn rank_prompts(
        &self,
        candidates: &[CandidatePrompt],
        target_task: &str,
    ) -> EngineResult<Vec<PromptRanking>> {
        self.ranker.rank(candidates, target_task).await
    }

    /// Judge one prompt/response pair
    pub async fn evaluate_prompt(
        &self,
        request: &PromptEvaluationRequest,
    ) -> EngineResult<EvaluationResult> {
        self.judge.evaluate(request).await
    }

    /// Run the iterative optimization loop
    pub async fn optimize_prompt(
        &self,
        request: &OptimizationRequest,
    ) -> EngineResult<OptimizationResult> {
        self.optimizer.optimize(request).await
    }

    /// Pick the best candidate via the meta-judge
    pub async fn select_best(&self, request: &SelectionRequest) -> EngineResult<SelectionResult> {
        self.selector.select_best(request).await
    }

    /// Re-read ranking weights from the config store
    pub async fn reload_weights(&self) -> EngineResult<()> {
        self.ranker.reload_weights().await
    }

    /// Start watching the config file for weight changes
    pub fn watch_config(&self) -> EngineResult<()> {
        self.ranker.watch_config()
    }

    pub fn ranker(&self) -> &Arc<Ranker> {
        &self.ranker
    }
}

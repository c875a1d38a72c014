//! Prompt ranker with configurable, hot-reloadable weights

use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use notify::RecommendedWatcher;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use shared::{CandidatePrompt, PromptRanking};

use crate::config::{keys, ConfigStore};
use crate::error::EngineResult;
use crate::traits::{Provider, ProviderRegistry};

/// Weight vector for the four ranking components.
///
/// Always normalized to sum to 1.0 before use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankingWeights {
    pub temperature: f64,
    pub token_length: f64,
    pub semantic: f64,
    pub length_ratio: f64,
}

impl RankingWeights {
    pub const DEFAULT: RankingWeights = RankingWeights {
        temperature: 0.25,
        token_length: 0.25,
        semantic: 0.35,
        length_ratio: 0.15,
    };

    pub fn sum(&self) -> f64 {
        self.temperature + self.token_length + self.semantic + self.length_ratio
    }

    /// Scale the vector so it sums to 1.0. An all-zero vector falls back
    /// to the built-in defaults rather than dividing by zero.
    pub fn normalized(self) -> Self {
        let sum = self.sum();
        if sum <= f64::EPSILON {
            return Self::DEFAULT;
        }
        Self {
            temperature: self.temperature / sum,
            token_length: self.token_length / sum,
            semantic: self.semantic / sum,
            length_ratio: self.length_ratio / sum,
        }
    }

    fn from_config(config: &ConfigStore) -> Self {
        Self {
            temperature: config.get_f64(keys::WEIGHT_TEMPERATURE),
            token_length: config.get_f64(keys::WEIGHT_TOKEN),
            semantic: config.get_f64(keys::WEIGHT_SEMANTIC),
            length_ratio: config.get_f64(keys::WEIGHT_LENGTH),
        }
        .normalized()
    }
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Ranks candidate prompts against a reference input
pub struct Ranker {
    registry: Arc<dyn ProviderRegistry>,
    // Shared with the watcher task in ranking::watcher
    pub(crate) config: Arc<ConfigStore>,
    weights: RwLock<RankingWeights>,
    embed_provider: String,
    embed_model: String,
    // Keeps the notify watcher alive for the ranker's lifetime
    pub(crate) watcher: Mutex<Option<RecommendedWatcher>>,
}

impl Ranker {
    /// Create a ranker, reading initial weights from the config store
    pub fn new(registry: Arc<dyn ProviderRegistry>, config: Arc<ConfigStore>) -> Self {
        let weights = RankingWeights::from_config(&config);
        let embed_provider = config.get_str(keys::EMBEDDING_PROVIDER);
        let embed_model = config.get_str(keys::EMBEDDING_MODEL);

        info!(
            w_temp = weights.temperature,
            w_token = weights.token_length,
            w_semantic = weights.semantic,
            w_length = weights.length_ratio,
            embedding_provider = %embed_provider,
            "ranker initialized"
        );

        Self {
            registry,
            config,
            weights: RwLock::new(weights),
            embed_provider,
            embed_model,
            watcher: Mutex::new(None),
        }
    }

    /// Re-read weights from the config store under the write lock.
    ///
    /// Also invoked automatically by the config file watcher.
    pub async fn reload_weights(&self) -> EngineResult<()> {
        let weights = RankingWeights::from_config(&self.config);
        *self.weights.write().await = weights;

        info!(
            w_temp = weights.temperature,
            w_token = weights.token_length,
            w_semantic = weights.semantic,
            w_length = weights.length_ratio,
            "reloaded ranking weights from config"
        );
        Ok(())
    }

    /// Current weight vector (read-locked snapshot)
    pub async fn weights(&self) -> RankingWeights {
        *self.weights.read().await
    }

    /// Rank candidates against the reference input, best first.
    ///
    /// The sort is stable, so candidates with equal scores keep their
    /// input order. Embedding failures degrade the semantic component
    /// to zero without failing the pass.
    pub async fn rank(
        &self,
        candidates: &[CandidatePrompt],
        reference_input: &str,
    ) -> EngineResult<Vec<PromptRanking>> {
        info!(candidate_count = candidates.len(), "ranking prompts");

        // One consistent weight snapshot for the whole pass
        let weights = *self.weights.read().await;

        let mut rankings = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            rankings.push(self.score_candidate(candidate, reference_input, &weights).await);
        }

        rankings.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(Ordering::Equal)
        });

        info!("finished ranking prompts");
        Ok(rankings)
    }

    async fn score_candidate(
        &self,
        candidate: &CandidatePrompt,
        reference_input: &str,
        weights: &RankingWeights,
    ) -> PromptRanking {
        let temperature_score = temperature_score(candidate.temperature);
        let token_score = token_score(candidate.content.len());
        let semantic_score = self.semantic_score(&candidate.content, reference_input).await;
        let length_score = length_ratio(&candidate.content, reference_input);

        let total_score = temperature_score * weights.temperature
            + token_score * weights.token_length
            + semantic_score * weights.semantic
            + length_score * weights.length_ratio;

        debug!(
            phase = %candidate.phase,
            total_score,
            temperature_score,
            token_score,
            semantic_score,
            length_score,
            "calculated prompt ranking"
        );

        PromptRanking {
            candidate: candidate.clone(),
            total_score,
            temperature_score,
            token_score,
            semantic_score,
            length_score,
        }
    }

    /// Cosine similarity of the two texts' embeddings, remapped from
    /// [-1,1] to [0,1]. Returns 0 when embeddings cannot be produced.
    async fn semantic_score(&self, text1: &str, text2: &str) -> f64 {
        let Some(provider) = self.resolve_embedding_provider() else {
            return 0.0;
        };

        let emb1 = match provider.get_embedding(text1).await {
            Ok(emb) => emb,
            Err(e) => {
                warn!(error = %e, text_length = text1.len(), "failed to embed candidate content");
                return 0.0;
            }
        };
        let emb2 = match provider.get_embedding(text2).await {
            Ok(emb) => emb,
            Err(e) => {
                warn!(error = %e, text_length = text2.len(), "failed to embed reference input");
                return 0.0;
            }
        };

        debug!(
            embedding_dim = emb1.len(),
            provider = provider.name(),
            "generated embeddings"
        );

        (cosine_similarity(&emb1, &emb2) + 1.0) / 2.0
    }

    /// Configured embedding provider, falling back to the first
    /// embedding-capable provider in the registry.
    fn resolve_embedding_provider(&self) -> Option<Arc<dyn Provider>> {
        if let Ok(provider) = self.registry.get(&self.embed_provider) {
            if provider.is_available() && provider.supports_embeddings() {
                debug!(
                    provider = provider.name(),
                    embedding_model = %self.embed_model,
                    "using configured embedding provider"
                );
                return Some(provider);
            }
        }

        let capable = self.registry.list_embedding_capable();
        let Some(name) = capable.first() else {
            warn!("no embedding-capable provider available, semantic score = 0");
            return None;
        };

        let provider = self.registry.get(name).ok()?;
        info!(
            requested_provider = %self.embed_provider,
            fallback_provider = provider.name(),
            embedding_model = %self.embed_model,
            "using fallback embedding provider"
        );
        Some(provider)
    }
}

/// Rewards proximity to a balanced temperature of 0.7.
///
/// Deliberately unclamped: extreme temperatures go negative.
fn temperature_score(temperature: f64) -> f64 {
    1.0 - (temperature - 0.7).abs() / 0.7
}

/// Rewards content length inside the preferred [100, 2000] char band
fn token_score(content_length: usize) -> f64 {
    if content_length < 100 {
        content_length as f64 / 100.0
    } else if content_length > 2000 {
        2000.0 / content_length as f64
    } else {
        1.0
    }
}

/// Length similarity in [0,1]; zero if either text is empty
fn length_ratio(text1: &str, text2: &str) -> f64 {
    let len1 = text1.len() as f64;
    let len2 = text2.len() as f64;
    if len1 == 0.0 || len2 == 0.0 {
        return 0.0;
    }
    let ratio = len1 / len2;
    if ratio > 1.0 {
        1.0 / ratio
    } else {
        ratio
    }
}

/// Cosine similarity of two vectors in [-1,1].
///
/// Mismatched lengths compare the shared prefix; zero-norm inputs
/// return 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let n = a.len().min(b.len());
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for i in 0..n {
        let va = a[i] as f64;
        let vb = b[i] as f64;
        dot += va * vb;
        norm_a += va * va;
        norm_b += vb * vb;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical_orthogonal_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let c = vec![-1.0, 0.0];

        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&a, &b).abs() < 1e-9);
        assert!((cosine_similarity(&a, &c) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_length_ratio() {
        assert_eq!(length_ratio("", ""), 0.0);
        assert_eq!(length_ratio("ab", "abcd"), 0.5);
        assert_eq!(length_ratio("abc", "abc"), 1.0);
        assert_eq!(length_ratio("abcd", "ab"), 0.5);
    }

    #[test]
    fn test_temperature_score_peaks_at_balanced() {
        assert!((temperature_score(0.7) - 1.0).abs() < 1e-9);
        assert!(temperature_score(0.0) < temperature_score(0.5));
        // Extreme temperatures are allowed to go negative
        assert!(temperature_score(2.0) < 0.0);
    }

    #[test]
    fn test_token_score_band() {
        assert_eq!(token_score(50), 0.5);
        assert_eq!(token_score(100), 1.0);
        assert_eq!(token_score(2000), 1.0);
        assert_eq!(token_score(4000), 0.5);
    }

    #[test]
    fn test_weights_normalize_to_one() {
        let weights = RankingWeights {
            temperature: 2.0,
            token_length: 2.0,
            semantic: 3.0,
            length_ratio: 1.0,
        }
        .normalized();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert!((weights.semantic - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weights_fall_back_to_defaults() {
        let weights = RankingWeights {
            temperature: 0.0,
            token_length: 0.0,
            semantic: 0.0,
            length_ratio: 0.0,
        }
        .normalized();
        assert_eq!(weights, RankingWeights::DEFAULT);
        assert!((weights.sum() - 1.0).abs() < 1e-9);
    }
}

//! Multi-factor prompt ranking
//!
//! Scores candidate prompts against a reference input using weighted
//! heuristics plus provider-supplied embeddings. Weights are
//! hot-reloadable from the configuration store.

mod ranker;
mod watcher;

pub use ranker::{cosine_similarity, Ranker, RankingWeights};

//! Engine-specific error types

use shared::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("provider '{name}' not registered")]
    ProviderNotFound { name: String },

    #[error("no candidates provided for selection")]
    NoCandidates,

    #[error("failed to get evaluation from provider")]
    Evaluation(#[source] ProviderError),

    #[error("failed to generate test response")]
    TestResponse(#[source] ProviderError),

    #[error("failed to evaluate original prompt")]
    OriginalEvaluation(#[source] Box<EngineError>),

    #[error("failed to generate improved prompt at iteration {iteration}")]
    Refinement {
        iteration: u32,
        #[source]
        source: ProviderError,
    },

    #[error("failed to evaluate improved prompt at iteration {iteration}")]
    IterationEvaluation {
        iteration: u32,
        #[source]
        source: Box<EngineError>,
    },

    #[error("failed to generate selection")]
    Selection(#[source] ProviderError),

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("config watcher error: {message}")]
    Watcher { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

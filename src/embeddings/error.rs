//! Embedding error taxonomy
//!
//! Splits failures into the two classes the HTTP layer cares about:
//! a model that never became available (503, operator intervention) and
//! a batch that failed to encode (500, caller resubmits the whole batch).

use thiserror::Error;

/// Errors produced by the embedding engine.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The embedding model failed to load (missing weights, unsupported
    /// hardware, download failure). Fatal: not retried, not defaulted to
    /// a degraded encoder.
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// Inference failed for a batch. The batch produced no partial
    /// results; the caller is expected to resubmit it.
    #[error("embedding inference failed: {0}")]
    Inference(String),
}

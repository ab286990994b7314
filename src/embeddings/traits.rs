//! EmbeddingProvider trait definition
//!
//! Defines the abstract interface for vector embedding generation.
//! Async trait + Send + Sync so providers can be shared across request
//! tasks via `Arc<dyn EmbeddingProvider>`.

use anyhow::Result;
use async_trait::async_trait;

/// Abstract interface for generating vector embeddings from text.
///
/// Implementations must be thread-safe (`Send + Sync`) to be shared
/// across async tasks via `Arc<dyn EmbeddingProvider>`.
///
/// # Implementations
///
/// - [`FastEmbedProvider`](super::FastEmbedProvider): in-process ONNX
///   inference via fastembed (the production provider)
/// - [`MockEmbeddingProvider`](super::MockEmbeddingProvider): deterministic
///   mock that produces consistent embeddings from text hashes (for tests)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate vector embeddings for multiple texts in a single batch.
    ///
    /// Returns a vector of unit-normalized embeddings, one per input text,
    /// in the same order. All-or-nothing: if any text in the batch fails
    /// to encode, the whole call fails with no partial results.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails for any text in the batch.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The dimensionality of the vectors produced by this provider.
    ///
    /// Fixed for a given model, discovered when the model is instantiated.
    fn dimensions(&self) -> usize;

    /// The name of the embedding model being used.
    ///
    /// Reported by the health endpoint so the librarian agent knows which
    /// model produced the vectors it is storing.
    fn model_name(&self) -> &str;
}

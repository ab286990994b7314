//! Mock embedding provider for tests
//!
//! Produces deterministic embeddings from text hashes, ensuring:
//! - Same text → same embedding (reproducible tests)
//! - Different texts → different embeddings (similarity tests work)
//! - Configurable dimensions (match the real provider's config)

use super::traits::EmbeddingProvider;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic mock embedding provider for tests.
///
/// Generates embeddings by hashing the input text and spreading the hash
/// across the configured number of dimensions. This ensures:
/// - Identical texts produce identical embeddings
/// - Different texts produce different embeddings (with very high probability)
/// - No network calls, no model files
///
/// # Example
///
/// ```rust
/// use ml_worker::embeddings::{EmbeddingProvider, MockEmbeddingProvider};
///
/// # tokio_test::block_on(async {
/// let provider = MockEmbeddingProvider::new(768);
/// let batch = provider.embed_batch(&["hello world".to_string()]).await.unwrap();
/// assert_eq!(batch[0].len(), 768);
///
/// // Same text → same embedding
/// let again = provider.embed_batch(&["hello world".to_string()]).await.unwrap();
/// assert_eq!(batch, again);
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    /// Create a new mock provider with the given embedding dimensions.
    ///
    /// Use 768 to match multilingual-e5-base (production default).
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Generate a deterministic embedding from text using hash spreading.
    ///
    /// Algorithm:
    /// 1. Hash the text with `DefaultHasher` (SipHash)
    /// 2. Use the hash as a seed to generate `dimensions` float values
    /// 3. Each dimension is derived by rehashing the previous hash
    /// 4. The resulting vector is L2-normalized (unit length)
    fn hash_to_embedding(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut hash = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimensions);
        for _ in 0..self.dimensions {
            // Map u64 to [-1.0, 1.0]
            let value = (hash as f64 / u64::MAX as f64) * 2.0 - 1.0;
            embedding.push(value as f32);

            // Chain hash for next dimension
            let mut h = DefaultHasher::new();
            hash.hash(&mut h);
            hash = h.finish();
        }

        super::fastembed::l2_normalize(&mut embedding);
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.hash_to_embedding(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "mock-hash-embedding"
    }
}

//! Lazy lifecycle management for the embedding model
//!
//! One process-wide model instance, loaded at most once. The engine owns
//! the handle exclusively; everything else goes through it. Startup
//! normally preloads the model (see `AppState::new`), so "not yet loaded"
//! is not an observable state during request handling. The `OnceCell`
//! guard keeps concurrent first access safe when preload is disabled.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;

use super::error::EmbeddingError;
use super::fastembed::FastEmbedProvider;
use super::traits::EmbeddingProvider;

/// Default model identifier (short form accepted by `FastEmbedProvider`).
pub const DEFAULT_MODEL: &str = "multilingual-e5-base";

/// Model selection and cache location, from config.
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    /// Short model identifier, e.g. `multilingual-e5-base`
    pub model: String,
    /// ONNX model cache directory (None = fastembed default)
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            cache_dir: None,
        }
    }
}

/// Owns the single lazily-initialized embedding model instance.
///
/// `ensure_loaded` is idempotent and guarantees at-most-one concurrent
/// model load: racing callers all await the same in-flight
/// initialization inside the `OnceCell`. Once loaded, the provider is
/// shared read-only; it is never recreated.
pub struct EmbeddingEngine {
    cell: OnceCell<Arc<dyn EmbeddingProvider>>,
    settings: EmbeddingSettings,
}

impl EmbeddingEngine {
    /// Create an engine that will load a `FastEmbedProvider` on first use.
    pub fn new(settings: EmbeddingSettings) -> Self {
        Self {
            cell: OnceCell::new(),
            settings,
        }
    }

    /// Create an engine seeded with an already-constructed provider.
    ///
    /// Used by tests (seed with
    /// [`MockEmbeddingProvider`](super::MockEmbeddingProvider)) and by
    /// callers that construct the provider themselves.
    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            cell: OnceCell::new_with(Some(provider)),
            settings: EmbeddingSettings::default(),
        }
    }

    /// Whether the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Get the loaded provider, loading the model if this is the first use.
    ///
    /// # Errors
    ///
    /// [`EmbeddingError::ModelUnavailable`] if the model cannot be loaded.
    /// A failed load is not cached: the next caller gets a fresh attempt,
    /// but there is never more than one attempt in flight.
    pub async fn ensure_loaded(&self) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
        let provider = self.cell.get_or_try_init(|| self.load()).await?;
        Ok(Arc::clone(provider))
    }

    async fn load(&self) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
        let model = self.settings.model.clone();
        let cache_dir = self.settings.cache_dir.clone();

        tracing::info!(model = %model, "Loading embedding model");
        let started = Instant::now();

        // Model construction downloads and mmaps ONNX weights — blocking
        let provider =
            tokio::task::spawn_blocking(move || FastEmbedProvider::from_name(&model, cache_dir))
                .await
                .map_err(|e| {
                    EmbeddingError::ModelUnavailable(format!("model load task panicked: {e}"))
                })?
                .map_err(|e| EmbeddingError::ModelUnavailable(format!("{e:#}")))?;

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            dimensions = provider.dimensions(),
            "Embedding model loaded"
        );

        let provider: Arc<dyn EmbeddingProvider> = Arc::new(provider);
        Ok(provider)
    }

    /// Embed a batch of texts, one unit-normalized vector per input, in
    /// input order. All-or-nothing: a failure yields no partial results.
    ///
    /// An empty batch returns an empty result without touching the model,
    /// so a no-op call never pays (or triggers) the load.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let provider = self.ensure_loaded().await?;
        provider
            .embed_batch(texts)
            .await
            .map_err(|e| EmbeddingError::Inference(format!("{e:#}")))
    }

    /// Dimensionality of the vectors this engine produces.
    ///
    /// Only known once the model is instantiated, so this triggers the
    /// load if it has not happened yet. Stable for the process lifetime.
    pub async fn dimension(&self) -> Result<usize, EmbeddingError> {
        Ok(self.ensure_loaded().await?.dimensions())
    }

    /// Identifier of the loaded model, for health reporting.
    pub async fn model_name(&self) -> Result<String, EmbeddingError> {
        Ok(self.ensure_loaded().await?.model_name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::mock::MockEmbeddingProvider;
    use anyhow::anyhow;
    use async_trait::async_trait;

    /// Provider whose inference always fails — exercises the
    /// all-or-nothing error path without a real model.
    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Err(anyhow!("onnx session crashed"))
        }

        fn dimensions(&self) -> usize {
            768
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_empty_batch_does_not_load_model() {
        // Fresh engine with no provider: an empty batch must short-circuit
        // before any load is attempted.
        let engine = EmbeddingEngine::new(EmbeddingSettings::default());
        assert!(!engine.is_loaded());

        let result = engine.embed_batch(&[]).await.unwrap();
        assert!(result.is_empty());
        assert!(!engine.is_loaded(), "empty batch must not trigger a load");
    }

    #[tokio::test]
    async fn test_ensure_loaded_is_idempotent() {
        let engine =
            EmbeddingEngine::with_provider(Arc::new(MockEmbeddingProvider::new(384)));

        let first = engine.ensure_loaded().await.unwrap();
        let second = engine.ensure_loaded().await.unwrap();
        assert!(
            Arc::ptr_eq(&first, &second),
            "repeated calls must return the same provider instance"
        );
    }

    #[tokio::test]
    async fn test_dimension_stable_and_matches_vectors() {
        let engine =
            EmbeddingEngine::with_provider(Arc::new(MockEmbeddingProvider::new(384)));

        let dim1 = engine.dimension().await.unwrap();
        let dim2 = engine.dimension().await.unwrap();
        assert_eq!(dim1, 384);
        assert_eq!(dim1, dim2);

        let batch = engine
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        for vector in &batch {
            assert_eq!(vector.len(), dim1);
        }
    }

    #[tokio::test]
    async fn test_embed_batch_preserves_order_and_length() {
        let engine =
            EmbeddingEngine::with_provider(Arc::new(MockEmbeddingProvider::new(128)));

        let texts: Vec<String> = (0..5).map(|i| format!("text number {i}")).collect();
        let batch = engine.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), texts.len());

        // Mock is deterministic: slot i must equal the embedding of text i
        let provider = MockEmbeddingProvider::new(128);
        for (i, text) in texts.iter().enumerate() {
            let single = provider.embed_batch(&[text.clone()]).await.unwrap();
            assert_eq!(batch[i], single[0], "order must be preserved 1:1");
        }
    }

    #[tokio::test]
    async fn test_concurrent_access_returns_same_provider() {
        let engine = Arc::new(EmbeddingEngine::with_provider(Arc::new(
            MockEmbeddingProvider::new(64),
        )));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                engine.ensure_loaded().await.unwrap()
            }));
        }

        let first = engine.ensure_loaded().await.unwrap();
        for handle in handles {
            let provider = handle.await.unwrap();
            assert!(Arc::ptr_eq(&first, &provider));
        }
    }

    #[tokio::test]
    async fn test_inference_failure_maps_to_inference_error() {
        let engine = EmbeddingEngine::with_provider(Arc::new(FailingProvider));

        let err = engine
            .embed_batch(&["boom".to_string()])
            .await
            .expect_err("failing provider must error");
        assert!(matches!(err, EmbeddingError::Inference(_)));
    }

    #[tokio::test]
    async fn test_model_name_from_provider() {
        let engine =
            EmbeddingEngine::with_provider(Arc::new(MockEmbeddingProvider::new(384)));
        assert_eq!(engine.model_name().await.unwrap(), "mock-hash-embedding");
    }
}

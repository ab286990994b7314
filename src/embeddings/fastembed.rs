//! Local embedding provider using fastembed-rs (ONNX Runtime)
//!
//! In-process ONNX inference — no external embedding server. Costs a
//! larger binary and in-process model memory (~200-400 MB), buys the
//! librarian a single-container deployment.
//!
//! Configuration via environment variables:
//! - `FASTEMBED_MODEL` (default: `multilingual-e5-base`) — model identifier
//! - `FASTEMBED_CACHE_DIR` (default: `.fastembed_cache`) — ONNX model cache directory
//!
//! Default model: `MultilingualE5Base` (768d). Notes arrive in Catalan,
//! Spanish, French, and English, so a multilingual encoder is required.

use super::traits::EmbeddingProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Model name → `EmbeddingModel` variant mapping.
///
/// Uses short lowercase identifiers matching common naming conventions.
/// Falls back to `MultilingualE5Base` for unknown names.
fn parse_model_name(name: &str) -> EmbeddingModel {
    match name.to_lowercase().as_str() {
        // Multilingual (recommended — notes are CA/ES/FR/EN)
        "multilingual-e5-base" | "intfloat/multilingual-e5-base" => {
            EmbeddingModel::MultilingualE5Base
        }
        "multilingual-e5-small" | "intfloat/multilingual-e5-small" => {
            EmbeddingModel::MultilingualE5Small
        }
        "multilingual-e5-large" | "intfloat/multilingual-e5-large" => {
            EmbeddingModel::MultilingualE5Large
        }
        // English-only alternatives
        "all-minilm-l6-v2" => EmbeddingModel::AllMiniLML6V2,
        "all-minilm-l12-v2" => EmbeddingModel::AllMiniLML12V2,
        "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "bge-m3" => EmbeddingModel::BGEM3,
        // Default fallback
        _ => {
            tracing::warn!(
                model = name,
                "Unknown FASTEMBED_MODEL, falling back to MultilingualE5Base (768d)"
            );
            EmbeddingModel::MultilingualE5Base
        }
    }
}

/// Get the embedding dimensions for a model variant.
fn model_dimensions(model: &EmbeddingModel) -> usize {
    TextEmbedding::get_model_info(model)
        .map(|info| info.dim)
        .unwrap_or(768)
}

/// Rescale a vector to unit Euclidean norm in place.
///
/// Most fastembed models already emit normalized vectors; this makes the
/// unit-norm contract hold regardless of which encoder is configured.
/// Zero vectors are left untouched.
pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Local embedding provider using fastembed-rs ONNX Runtime.
///
/// Thread-safe via `Arc<Mutex<TextEmbedding>>` because `embed()` requires
/// `&mut self` — concurrent batches serialize through the mutex rather
/// than overlapping inside the ONNX session. All embedding calls are
/// dispatched to `tokio::spawn_blocking` to avoid blocking the async
/// runtime (ONNX inference is CPU-bound).
pub struct FastEmbedProvider {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimensions: usize,
}

impl FastEmbedProvider {
    /// Create a new FastEmbed provider with explicit configuration.
    ///
    /// Blocking: downloads the ONNX model on first use. Callers on the
    /// async runtime must wrap this in `spawn_blocking` (the engine does).
    ///
    /// # Errors
    ///
    /// Returns an error if the ONNX model cannot be loaded (download
    /// failure, corrupted cache, unsupported platform, etc.)
    pub fn new(model_variant: EmbeddingModel, cache_dir: Option<PathBuf>) -> Result<Self> {
        let dimensions = model_dimensions(&model_variant);
        let model_name = format!("{:?}", model_variant);

        let mut options = TextInitOptions::new(model_variant).with_show_download_progress(true);

        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let embedding =
            TextEmbedding::try_new(options).context("Failed to initialize fastembed ONNX model")?;

        tracing::info!(
            model = %model_name,
            dimensions,
            "FastEmbed provider initialized (local ONNX)"
        );

        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            model_name,
            dimensions,
        })
    }

    /// Create a provider from a short model identifier such as
    /// `multilingual-e5-base` (the form used in config files and
    /// `FASTEMBED_MODEL`).
    pub fn from_name(name: &str, cache_dir: Option<PathBuf>) -> Result<Self> {
        Self::new(parse_model_name(name), cache_dir)
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let model = self.model.clone();
        let texts = texts.to_vec();

        let mut embeddings = tokio::task::spawn_blocking(move || {
            let mut model = model.blocking_lock();
            model.embed(texts, None)
        })
        .await
        .context("FastEmbed spawn_blocking panicked")?
        .context("FastEmbed embed_batch failed")?;

        for embedding in &mut embeddings {
            l2_normalize(embedding);
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

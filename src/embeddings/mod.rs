//! Embedding generation module
//!
//! Converts batches of text into fixed-dimension, L2-normalized vectors
//! for semantic search in the notes knowledge graph.
//!
//! Architecture follows the trait + impl + mock pattern:
//! - `EmbeddingProvider` trait: async interface for embedding generation
//! - `FastEmbedProvider`: real implementation using in-process ONNX inference
//! - `MockEmbeddingProvider`: deterministic mock for tests
//! - `EmbeddingEngine`: lazy lifecycle manager owning the single
//!   process-wide model instance

pub mod engine;
pub mod error;
pub mod fastembed;
pub mod mock;
pub mod traits;

pub use engine::{EmbeddingEngine, EmbeddingSettings};
pub use error::EmbeddingError;
pub use fastembed::FastEmbedProvider;
pub use mock::MockEmbeddingProvider;
pub use traits::EmbeddingProvider;

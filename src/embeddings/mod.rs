// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sentence embedding model plumbing
//!
//! - [`Embedder`]: the batch-encode seam used by the HTTP layer
//! - [`OnnxEmbeddingModel`]: all-MiniLM-L6-v2 on ONNX Runtime
//! - [`ModelSource`]: where the model files come from (local dir or the Hub)
//! - [`ModelHolder`]: write-once, process-wide home of the loaded model

pub mod errors;
pub mod model_holder;
pub mod model_source;
pub mod onnx_model;

pub use errors::EmbeddingError;
pub use model_holder::ModelHolder;
pub use model_source::{ModelFiles, ModelSource};
pub use onnx_model::{OnnxEmbeddingModel, OnnxModelOptions};

use async_trait::async_trait;

/// Hugging Face repository of the default model
pub const DEFAULT_MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output dimension of all-MiniLM-L6-v2
pub const DEFAULT_DIMENSION: usize = 384;

/// Maximum sequence length used by the sentence-transformers pipeline
pub const DEFAULT_MAX_SEQ_LENGTH: usize = 256;

/// A loaded model that maps texts to fixed-length vectors.
///
/// Implementations must be read-only after construction: `embed_batch` is
/// called concurrently from request handlers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the loaded model
    fn model_name(&self) -> &str;

    /// Length of every vector returned by `embed_batch`
    fn dimension(&self) -> usize;

    /// Encodes `texts` as one batch. Output `i` belongs to input `i`.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding Model Holder
//!
//! Process-wide home of the single loaded model. The holder is created empty,
//! filled exactly once at startup (before the listener is bound) and read
//! without locking afterwards.

use super::{EmbeddingError, Embedder, ModelSource, OnnxEmbeddingModel, OnnxModelOptions};
use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};
use tracing::{error, info};

/// Write-once holder for the service's embedding model
///
/// # Example
/// ```ignore
/// let holder = ModelHolder::new("sentence-transformers/all-MiniLM-L6-v2");
/// holder.load(&source, OnnxModelOptions::default()).await?;
/// let vectors = holder.encode(&["Hello world".to_string()]).await?;
/// ```
pub struct ModelHolder {
    model_name: String,
    model: OnceLock<Arc<dyn Embedder>>,
}

impl std::fmt::Debug for ModelHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHolder")
            .field("model_name", &self.model_name)
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl ModelHolder {
    /// Creates an empty holder for the named model
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            model: OnceLock::new(),
        }
    }

    /// Creates a holder that is already ready
    pub fn with_model(model: Arc<dyn Embedder>) -> Self {
        let holder = Self::new(model.model_name());
        // A fresh OnceLock cannot already be set
        let _ = holder.model.set(model);
        holder
    }

    /// Resolves `source`, builds the ONNX model and installs it
    ///
    /// Fails if the files cannot be fetched, the runtime rejects the model,
    /// the output dimension does not match `options.dimension`, or a model
    /// is already installed.
    pub async fn load(&self, source: &ModelSource, options: OnnxModelOptions) -> Result<()> {
        if self.is_ready() {
            return Err(EmbeddingError::AlreadyLoaded(self.model_name.clone()).into());
        }

        info!("Loading embedding model: {}", self.model_name);

        let result = async {
            let files = source.resolve().await?;
            OnnxEmbeddingModel::new(self.model_name.clone(), &files, options).await
        }
        .await;

        match result {
            Ok(model) => {
                self.install(Arc::new(model))
                    .context("Failed to install embedding model")?;
                info!("✓ Model loaded successfully: {}", self.model_name);
                Ok(())
            }
            Err(e) => {
                error!("Failed to load model {}: {:#}", self.model_name, e);
                Err(e)
            }
        }
    }

    /// Installs an already-constructed model. Only the first call succeeds.
    pub fn install(&self, model: Arc<dyn Embedder>) -> Result<(), EmbeddingError> {
        self.model
            .set(model)
            .map_err(|_| EmbeddingError::AlreadyLoaded(self.model_name.clone()))
    }

    /// Whether a model has been installed
    pub fn is_ready(&self) -> bool {
        self.model.get().is_some()
    }

    /// Configured model identifier
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Output dimension, once loaded
    pub fn dimension(&self) -> Option<usize> {
        self.model.get().map(|m| m.dimension())
    }

    /// Encodes `texts` as a single batch; output `i` belongs to input `i`
    pub async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let model = self.model.get().ok_or(EmbeddingError::NotReady)?;

        let embeddings = model
            .embed_batch(texts)
            .await
            .map_err(EmbeddingError::Encode)?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }

        Ok(embeddings)
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! This module provides a wrapper around ONNX Runtime for running
//! the all-MiniLM-L6-v2 sentence transformer model.
//!
//! Features:
//! - ONNX model loading from disk
//! - Optional CUDA acceleration (`cuda` feature) with automatic CPU fallback
//! - BERT tokenization with truncation and batch padding
//! - Batch embedding generation on the blocking thread pool
//! - Attention-masked mean pooling followed by L2 normalization
//! - 384-dimensional output vectors

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::{Embedder, ModelFiles, DEFAULT_DIMENSION, DEFAULT_MAX_SEQ_LENGTH};

/// Runtime knobs for [`OnnxEmbeddingModel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnnxModelOptions {
    /// Expected hidden size; checked by a validation inference at load time
    pub dimension: usize,
    /// Inputs longer than this many tokens are truncated
    pub max_seq_length: usize,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for OnnxModelOptions {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            max_seq_length: DEFAULT_MAX_SEQ_LENGTH,
            intra_threads: 4,
        }
    }
}

/// ONNX-based embedding model (all-MiniLM-L6-v2)
///
/// The model uses a sentence transformer architecture with:
/// - BERT-based tokenizer
/// - Mean pooling over token embeddings
/// - L2 normalization
///
/// # Thread Safety
/// The session and tokenizer sit behind `Arc` so inference can move onto
/// `spawn_blocking`. ONNX Runtime needs `&mut Session` per run, hence the
/// mutex; nothing else is mutated after construction.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
    max_seq_length: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("max_seq_length", &self.max_seq_length)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Creates a new ONNX embedding model from resolved model files
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found or invalid
    /// - Tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - Model output is not `[batch, seq_len, options.dimension]`
    ///
    /// # Example
    /// ```ignore
    /// let files = ModelSource::Local { dir: "./models/all-MiniLM-L6-v2".into() }
    ///     .resolve()
    ///     .await?;
    /// let model = OnnxEmbeddingModel::new(
    ///     "sentence-transformers/all-MiniLM-L6-v2",
    ///     &files,
    ///     OnnxModelOptions::default(),
    /// ).await?;
    /// ```
    pub async fn new(
        model_name: impl Into<String>,
        files: &ModelFiles,
        options: OnnxModelOptions,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = files.model_path.clone();
        let tokenizer_path = files.tokenizer_path.clone();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        // Session creation and the validation run are CPU-bound
        tokio::task::spawn_blocking(move || {
            Self::load_blocking(model_name, &model_path, &tokenizer_path, options)
        })
        .await
        .context("Model loading task panicked")?
    }

    fn load_blocking(
        model_name: String,
        model_path: &Path,
        tokenizer_path: &Path,
        options: OnnxModelOptions,
    ) -> Result<Self> {
        info!("Initializing ONNX embedding model: {}", model_name);
        let session = build_session(model_path, options.intra_threads)?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: options.max_seq_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
        // Padding is applied per batch in run_batch
        tokenizer.with_padding(None);

        let model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: options.dimension,
            max_seq_length: options.max_seq_length,
        };

        // Validation inference: catches a wrong export or hidden size before serving
        let probe = model
            .run_batch(&["validation test".to_string()])
            .context("Validation inference failed")?;
        if probe.len() != 1 || probe[0].len() != model.dimension {
            anyhow::bail!(
                "Model validation produced unexpected output: {} vectors of {} dimensions (expected 1 x {})",
                probe.len(),
                probe.first().map(Vec::len).unwrap_or(0),
                model.dimension
            );
        }

        info!(
            "ONNX embedding model loaded: {} ({} dimensions)",
            model.model_name, model.dimension
        );
        Ok(model)
    }

    /// Generates embeddings for multiple texts in one inference call
    ///
    /// Tokenizes all texts, pads to the longest item and runs the batch on
    /// the blocking pool. Returns one L2-normalized vector per input.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let model = self.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || model.run_batch(&texts))
            .await
            .context("Embedding task panicked")?
    }

    /// Counts tokens in a text string (after truncation, special tokens included)
    pub fn count_tokens(&self, text: &str) -> Result<usize> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        Ok(encoding.get_attention_mask().iter().map(|&m| m as usize).sum())
    }

    /// Returns the output dimension of this model
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the truncation length
    pub fn max_seq_length(&self) -> usize {
        self.max_seq_length
    }

    fn run_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch = encodings.len();
        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0);
        debug!("Running ONNX batch: {} texts, {} tokens each", batch, max_len);

        // Pad every sequence to max_len
        let mut input_ids = Vec::with_capacity(batch * max_len);
        let mut attention_mask = Vec::with_capacity(batch * max_len);
        let mut token_type_ids = Vec::with_capacity(batch * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let padding = max_len - ids.len();

            input_ids.extend(ids.iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            token_type_ids.extend(encoding.get_type_ids().iter().map(|&t| t as i64));

            input_ids.extend(std::iter::repeat(0i64).take(padding));
            attention_mask.extend(std::iter::repeat(0i64).take(padding));
            token_type_ids.extend(std::iter::repeat(0i64).take(padding));
        }

        let mask_for_pooling = attention_mask.clone();

        let input_ids_array = Array2::from_shape_vec((batch, max_len), input_ids)
            .context("Failed to create input_ids array")?;
        let attention_mask_array = Array2::from_shape_vec((batch, max_len), attention_mask)
            .context("Failed to create attention_mask array")?;
        let token_type_ids_array = Array2::from_shape_vec((batch, max_len), token_type_ids)
            .context("Failed to create token_type_ids array")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(input_ids_array)?,
            "attention_mask" => Value::from_array(attention_mask_array)?,
            "token_type_ids" => Value::from_array(token_type_ids_array)?
        ])?;

        // Index [0]: exports differ in the output name (last_hidden_state, token_embeddings)
        let hidden = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let shape = hidden.shape();
        if shape.len() != 3 || shape[0] != batch || shape[2] != self.dimension {
            anyhow::bail!(
                "Model outputs unexpected dimensions: {:?} (expected [{}, seq_len, {}])",
                shape,
                batch,
                self.dimension
            );
        }

        let mut embeddings = Vec::with_capacity(batch);
        for item in 0..batch {
            let tokens = hidden.index_axis(Axis(0), item); // [seq_len, hidden_dim]
            let mask = &mask_for_pooling[item * max_len..(item + 1) * max_len];

            let mut pooled = mean_pool(
                tokens
                    .outer_iter()
                    .map(|row| row.iter().copied().collect::<Vec<f32>>()),
                mask,
                self.dimension,
            );
            l2_normalize(&mut pooled);
            embeddings.push(pooled);
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for OnnxEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        OnnxEmbeddingModel::embed_batch(self, texts).await
    }
}

fn build_session(model_path: &Path, intra_threads: usize) -> Result<Session> {
    #[cfg(feature = "cuda")]
    {
        use ort::execution_providers::CUDAExecutionProvider;

        info!("Attempting CUDA execution provider...");
        let cuda_result = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .context("Failed to set CUDA execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path);

        match cuda_result {
            Ok(session) => {
                info!("CUDA execution provider initialized");
                return Ok(session);
            }
            Err(e) => {
                tracing::warn!("CUDA execution provider failed: {}", e);
                tracing::warn!("Falling back to CPU execution provider");
            }
        }
    }

    Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .context("Failed to set CPU execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))
}

/// Averages token vectors, weighting by the attention mask so padding is ignored
fn mean_pool<I>(tokens: I, mask: &[i64], hidden_dim: usize) -> Vec<f32>
where
    I: Iterator<Item = Vec<f32>>,
{
    let mut pooled = vec![0.0f32; hidden_dim];
    let mut sum_mask = 0.0f32;

    for (token, &m) in tokens.zip(mask) {
        let weight = m as f32;
        sum_mask += weight;
        for (acc, value) in pooled.iter_mut().zip(token) {
            *acc += value * weight;
        }
    }

    for value in &mut pooled {
        *value /= sum_mask.max(1e-9);
    }
    pooled
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the model holder

use thiserror::Error;

/// Errors surfaced by [`super::ModelHolder`]
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Encode was called before a model was installed
    #[error("Model not loaded")]
    NotReady,

    /// A model was already installed; the holder is write-once
    #[error("Model already loaded: {0}")]
    AlreadyLoaded(String),

    /// The model returned the wrong number of vectors
    #[error("Model returned {actual} embeddings for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    /// Inference failed inside the model
    #[error("{0:#}")]
    Encode(#[source] anyhow::Error),
}

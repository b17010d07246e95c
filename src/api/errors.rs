// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::embeddings::EmbeddingError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Body of every error response: `{"error": "<message>"}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request-level failures of the embeddings endpoint.
///
/// The display strings are part of the wire contract; clients match on them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Missing \"inputs\" field in request body")]
    MissingInputs,

    #[error("\"inputs\" must be a list of strings")]
    InputsNotList,

    #[error("\"inputs\" list cannot be empty")]
    EmptyInputs,

    /// `index` is the first offending element
    #[error("All inputs must be strings")]
    NonStringInput { index: usize },

    #[error("Model not loaded. Please restart the service.")]
    ModelNotReady,

    #[error("Failed to generate embeddings: {0}")]
    EncodingFailed(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingInputs
            | ApiError::InputsNotList
            | ApiError::EmptyInputs
            | ApiError::NonStringInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::ModelNotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::EncodingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
        }
    }
}

impl From<EmbeddingError> for ApiError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::NotReady => ApiError::ModelNotReady,
            other => {
                error!("Error generating embeddings: {}", other);
                ApiError::EncodingFailed(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}

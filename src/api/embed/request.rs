// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbeddingsRequest type for POST /embeddings
//!
//! The body is checked against the schema step by step so each failure maps
//! to its own [`ApiError`] variant, in this order: missing field, not a list,
//! empty list, non-string element.

use crate::api::ApiError;
use serde_json::Value;

/// Request body for POST /embeddings
///
/// # Example
/// ```json
/// {
///   "inputs": ["Senior Rust engineer", "Experience with tokio and axum"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingsRequest {
    /// Texts to embed, in output order
    pub inputs: Vec<String>,
}

impl EmbeddingsRequest {
    /// Parses and validates a raw request body.
    ///
    /// Bodies that are not JSON, or not a JSON object, are reported as a
    /// missing `inputs` field.
    pub fn from_slice(body: &[u8]) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::MissingInputs)?;
        Self::from_value(value)
    }

    /// Validates an already-parsed JSON body
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        let inputs = match value {
            Value::Object(mut fields) => fields.remove("inputs").ok_or(ApiError::MissingInputs)?,
            _ => return Err(ApiError::MissingInputs),
        };

        let items = match inputs {
            Value::Array(items) => items,
            _ => return Err(ApiError::InputsNotList),
        };

        if items.is_empty() {
            return Err(ApiError::EmptyInputs);
        }

        let inputs = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(text) => Ok(text),
                _ => Err(ApiError::NonStringInput { index }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { inputs })
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

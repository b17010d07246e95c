// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embeddings HTTP handler

use crate::api::embed::EmbeddingsRequest;
use crate::api::http_server::AppState;
use crate::api::ApiError;
use axum::{body::Bytes, extract::State, Json};
use tracing::{debug, info};

/// POST /embeddings handler
///
/// # Request Body
/// ```json
/// { "inputs": ["text1", "text2"] }
/// ```
///
/// # Response Body
/// The bare array of vectors, one per input, in input order:
/// ```json
/// [[0.123, 0.456, ...], [0.789, 0.012, ...]]
/// ```
///
/// The body is taken as raw bytes so a missing or wrong `Content-Type`
/// does not change the validation outcome.
pub async fn embeddings_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<Vec<f32>>>, ApiError> {
    let request = EmbeddingsRequest::from_slice(&body)?;

    if !state.model.is_ready() {
        return Err(ApiError::ModelNotReady);
    }

    info!("Generating embeddings for {} text(s)", request.len());
    debug!(
        "Text lengths: {:?}",
        request
            .inputs
            .iter()
            .map(|text| text.chars().count())
            .collect::<Vec<_>>()
    );

    let embeddings = state.model.encode(&request.inputs).await?;

    info!("✓ Generated {} embeddings", embeddings.len());
    Ok(Json(embeddings))
}

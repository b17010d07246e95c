// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding API Module
//!
//! POST /embeddings: validate the body, batch-encode with the loaded model,
//! return one vector per input.

pub mod handler;
pub mod request;

pub use handler::embeddings_handler;
pub use request::EmbeddingsRequest;

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Concurrent /embeddings requests against one shared model
//!
//! Each response must contain exactly the vectors for its own inputs.

use crate::common::{app_with, post_json, vectors, HashEmbedder, TEST_DIMENSION};
use axum::http::StatusCode;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_isolated() {
    let embedder = Arc::new(HashEmbedder {
        dimension: TEST_DIMENSION,
        delay: Some(Duration::from_millis(20)),
    });
    let app = app_with(embedder.clone());

    let mut tasks = Vec::new();
    for i in 0..16 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            let inputs: Vec<String> = (0..(i % 4) + 1)
                .map(|j| format!("request {} text {}", i, j))
                .collect();
            let body = serde_json::json!({ "inputs": inputs }).to_string();
            let (status, json) = post_json(app, "/embeddings", &body).await;
            (inputs, status, json)
        }));
    }

    for task in tasks {
        let (inputs, status, json) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);

        let vectors = vectors(&json);
        assert_eq!(vectors.len(), inputs.len());
        for (text, vector) in inputs.iter().zip(&vectors) {
            assert_eq!(vector, &embedder.embed_one(text));
        }
    }
}

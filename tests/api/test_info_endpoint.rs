// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET / tests

use crate::common::{get, ready_app, unloaded_app, TEST_MODEL};
use ats_semantic_service::api::ServiceInfo;
use axum::http::StatusCode;

#[tokio::test]
async fn test_info_metadata() {
    let (status, json) = get(ready_app(), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!({
            "service": "ATS Semantic Analysis Service",
            "model": TEST_MODEL,
            "version": "1.0.0",
            "endpoints": {
                "health": "/health",
                "embeddings": "/embeddings (POST)"
            }
        })
    );
}

#[tokio::test]
async fn test_info_available_before_load() {
    let (status, json) = get(unloaded_app(), "/").await;

    assert_eq!(status, StatusCode::OK);
    let info: ServiceInfo = serde_json::from_value(json).unwrap();
    assert_eq!(info.model, TEST_MODEL);
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ModelHolder lifecycle tests (no model files needed)

use crate::common::{HashEmbedder, TEST_DIMENSION, TEST_MODEL};
use ats_semantic_service::embeddings::{
    EmbeddingError, ModelHolder, ModelSource, OnnxModelOptions,
};
use std::sync::Arc;

#[tokio::test]
async fn test_load_fails_for_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let holder = ModelHolder::new(TEST_MODEL);

    let err = holder
        .load(
            &ModelSource::Local {
                dir: dir.path().to_path_buf(),
            },
            OnnxModelOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(
        err.to_string().contains("not found"),
        "unexpected error: {}",
        err
    );
    assert!(!holder.is_ready());
}

#[tokio::test]
async fn test_load_fails_for_corrupt_model() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("model.onnx"), b"not an onnx graph").unwrap();
    std::fs::write(dir.path().join("tokenizer.json"), b"{}").unwrap();
    let holder = ModelHolder::new(TEST_MODEL);

    let result = holder
        .load(
            &ModelSource::Local {
                dir: dir.path().to_path_buf(),
            },
            OnnxModelOptions::default(),
        )
        .await;

    assert!(result.is_err());
    assert!(!holder.is_ready());
}

#[tokio::test]
async fn test_encode_not_ready_then_ready() {
    let holder = ModelHolder::new(TEST_MODEL);
    let texts = vec!["a".to_string()];

    assert!(matches!(
        holder.encode(&texts).await,
        Err(EmbeddingError::NotReady)
    ));

    holder
        .install(Arc::new(HashEmbedder::new(TEST_DIMENSION)))
        .unwrap();

    let out = holder.encode(&texts).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].len(), TEST_DIMENSION);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_encode_through_holder() {
    let embedder = Arc::new(HashEmbedder::new(TEST_DIMENSION));
    let holder = Arc::new(ModelHolder::with_model(embedder.clone()));

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let holder = holder.clone();
            tokio::spawn(async move {
                let texts = vec![format!("text {}", i), format!("other {}", i)];
                let out = holder.encode(&texts).await.unwrap();
                (texts, out)
            })
        })
        .collect();

    for handle in handles {
        let (texts, out) = handle.await.unwrap();
        assert_eq!(out[0], embedder.embed_one(&texts[0]));
        assert_eq!(out[1], embedder.embed_one(&texts[1]));
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX model tests against the real all-MiniLM-L6-v2 export
//!
//! Ignored by default. Download the model first, e.g.
//! `huggingface-cli download sentence-transformers/all-MiniLM-L6-v2 tokenizer.json onnx/model.onnx --local-dir ./models/all-MiniLM-L6-v2`,
//! then run with `--ignored` (set EMBED_MODEL_DIR to use another location).

use ats_semantic_service::embeddings::{
    ModelHolder, ModelSource, OnnxEmbeddingModel, OnnxModelOptions,
};
use std::path::PathBuf;
use std::sync::Arc;

const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";

fn model_dir() -> PathBuf {
    std::env::var("EMBED_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./models/all-MiniLM-L6-v2"))
}

async fn load_model() -> OnnxEmbeddingModel {
    let files = ModelSource::Local { dir: model_dir() }
        .resolve()
        .await
        .expect("Model files not found");
    OnnxEmbeddingModel::new(MODEL_NAME, &files, OnnxModelOptions::default())
        .await
        .expect("Failed to load model")
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[tokio::test]
#[ignore] // Only run if model files are downloaded
async fn test_model_loads_with_384_dimensions() {
    let model = load_model().await;
    assert_eq!(model.dimension(), 384);
    assert_eq!(model.model_name(), MODEL_NAME);
}

#[tokio::test]
#[ignore] // Only run if model files are downloaded
async fn test_batch_returns_normalized_vectors_in_order() {
    let model = load_model().await;
    let texts = vec![
        "The cat sits on the mat".to_string(),
        "A feline rests on a rug".to_string(),
        "Quarterly revenue grew by 12 percent".to_string(),
    ];

    let embeddings = model.embed_batch(&texts).await.unwrap();
    assert_eq!(embeddings.len(), 3);

    for embedding in &embeddings {
        assert_eq!(embedding.len(), 384);
        let norm = cosine(embedding, embedding).sqrt();
        assert!((norm - 1.0).abs() < 1e-3, "norm was {}", norm);
    }

    // Paraphrases are closer than unrelated text
    let similar = cosine(&embeddings[0], &embeddings[1]);
    let unrelated = cosine(&embeddings[0], &embeddings[2]);
    assert!(similar > unrelated, "{} <= {}", similar, unrelated);

    // Batch position matches single-item encoding (padding must not leak)
    let single = model.embed_batch(&texts[2..].to_vec()).await.unwrap();
    let drift = cosine(&single[0], &embeddings[2]);
    assert!(drift > 0.999, "cosine to single encoding was {}", drift);
}

#[tokio::test]
#[ignore] // Only run if model files are downloaded
async fn test_deterministic_output() {
    let model = load_model().await;
    let texts = vec!["Senior Rust engineer".to_string()];

    let first = model.embed_batch(&texts).await.unwrap();
    let second = model.embed_batch(&texts).await.unwrap();

    for (a, b) in first[0].iter().zip(&second[0]) {
        assert!((a - b).abs() < 1e-6);
    }
}

#[tokio::test]
#[ignore] // Only run if model files are downloaded
async fn test_long_input_is_truncated() {
    let model = load_model().await;
    let long_text = "word ".repeat(10_000);

    assert_eq!(model.count_tokens(&long_text).unwrap(), 256);
    let embeddings = model.embed_batch(&[long_text]).await.unwrap();
    assert_eq!(embeddings[0].len(), 384);
}

#[tokio::test]
#[ignore] // Only run if model files are downloaded
async fn test_wrong_dimension_rejected_at_load() {
    let files = ModelSource::Local { dir: model_dir() }
        .resolve()
        .await
        .expect("Model files not found");
    let options = OnnxModelOptions {
        dimension: 768,
        ..Default::default()
    };

    let err = OnnxEmbeddingModel::new(MODEL_NAME, &files, options)
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("unexpected dimensions"));
}

#[tokio::test]
#[ignore] // Only run if model files are downloaded
async fn test_holder_load_and_concurrent_encode() {
    let holder = Arc::new(ModelHolder::new(MODEL_NAME));
    holder
        .load(
            &ModelSource::Local { dir: model_dir() },
            OnnxModelOptions::default(),
        )
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let holder = holder.clone();
        tasks.push(tokio::spawn(async move {
            let texts = vec![format!("candidate profile number {}", i)];
            let out = holder.encode(&texts).await.unwrap();
            (texts, out)
        }));
    }

    let model = load_model().await;
    for task in tasks {
        let (texts, out) = task.await.unwrap();
        let expected = model.embed_batch(&texts).await.unwrap();
        assert!(cosine(&out[0], &expected[0]) > 0.999);
    }
}

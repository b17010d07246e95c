// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model file resolution
//!
//! The service needs two artifacts: the ONNX graph and the tokenizer JSON.
//! They either sit in a local directory or are pulled from the Hugging Face
//! Hub into the hf-hub cache on first start.

use anyhow::{Context, Result};
use hf_hub::api::tokio::{Api, ApiBuilder};
use std::path::{Path, PathBuf};
use tracing::info;

const MODEL_FILE: &str = "model.onnx";
const HUB_MODEL_FILE: &str = "onnx/model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Resolved on-disk paths of the model artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
}

/// Where to get the model from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Pre-downloaded files
    Local { dir: PathBuf },
    /// Hugging Face Hub repository, e.g. `sentence-transformers/all-MiniLM-L6-v2`
    Hub {
        repo_id: String,
        cache_dir: Option<PathBuf>,
    },
}

impl ModelSource {
    /// Resolves the source to local file paths, downloading if needed
    pub async fn resolve(&self) -> Result<ModelFiles> {
        match self {
            ModelSource::Local { dir } => resolve_local(dir),
            ModelSource::Hub { repo_id, cache_dir } => {
                resolve_hub(repo_id, cache_dir.as_deref()).await
            }
        }
    }
}

fn resolve_local(dir: &Path) -> Result<ModelFiles> {
    if !dir.is_dir() {
        anyhow::bail!("Model directory not found: {}", dir.display());
    }

    // Accept both the flat export layout and the Hub's onnx/ subfolder
    let model_path = [dir.join(MODEL_FILE), dir.join(HUB_MODEL_FILE)]
        .into_iter()
        .find(|p| p.exists())
        .with_context(|| {
            format!(
                "ONNX model file not found: {} (or {})",
                dir.join(MODEL_FILE).display(),
                dir.join(HUB_MODEL_FILE).display()
            )
        })?;

    let tokenizer_path = dir.join(TOKENIZER_FILE);
    if !tokenizer_path.exists() {
        anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
    }

    Ok(ModelFiles {
        model_path,
        tokenizer_path,
    })
}

async fn resolve_hub(repo_id: &str, cache_dir: Option<&Path>) -> Result<ModelFiles> {
    info!("Fetching {} from the Hugging Face Hub", repo_id);
    info!("This may take a few minutes on first run");

    let api = match cache_dir {
        Some(dir) => ApiBuilder::new()
            .with_cache_dir(dir.to_path_buf())
            .build()
            .context("Failed to create Hugging Face Hub client")?,
        None => Api::new().context("Failed to create Hugging Face Hub client")?,
    };
    let repo = api.model(repo_id.to_string());

    let tokenizer_path = repo
        .get(TOKENIZER_FILE)
        .await
        .with_context(|| format!("Failed to fetch {} from {}", TOKENIZER_FILE, repo_id))?;
    let model_path = repo
        .get(HUB_MODEL_FILE)
        .await
        .with_context(|| format!("Failed to fetch {} from {}", HUB_MODEL_FILE, repo_id))?;

    Ok(ModelFiles {
        model_path,
        tokenizer_path,
    })
}

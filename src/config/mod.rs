// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Service configuration
//!
//! Every value has a CLI flag and an environment fallback; the defaults are
//! the service's historical constants (0.0.0.0:5001, all-MiniLM-L6-v2).

use crate::embeddings::{
    ModelSource, OnnxModelOptions, DEFAULT_DIMENSION, DEFAULT_MAX_SEQ_LENGTH, DEFAULT_MODEL_NAME,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

/// Sentence embedding HTTP service
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "ats-semantic-service")]
#[command(version)]
#[command(about = "Serves SBERT sentence embeddings over HTTP", long_about = None)]
pub struct ServiceConfig {
    /// Interface to bind
    #[arg(long, env = "EMBED_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "EMBED_PORT", default_value_t = 5001)]
    pub port: u16,

    /// Hugging Face model repository to serve
    #[arg(long, env = "EMBED_MODEL", default_value = DEFAULT_MODEL_NAME)]
    pub model: String,

    /// Directory with model.onnx and tokenizer.json (skips the Hub download)
    #[arg(long, env = "EMBED_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// hf-hub cache directory
    #[arg(long, env = "EMBED_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Expected embedding dimension
    #[arg(long, env = "EMBED_DIMENSION", default_value_t = DEFAULT_DIMENSION)]
    pub dimension: usize,

    /// Token limit per input; longer inputs are truncated
    #[arg(long, env = "EMBED_MAX_SEQ_LENGTH", default_value_t = DEFAULT_MAX_SEQ_LENGTH)]
    pub max_seq_length: usize,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "EMBED_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            model: DEFAULT_MODEL_NAME.to_string(),
            model_dir: None,
            cache_dir: None,
            dimension: DEFAULT_DIMENSION,
            max_seq_length: DEFAULT_MAX_SEQ_LENGTH,
            intra_threads: 4,
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            anyhow::bail!("host cannot be empty");
        }
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }
        if self.model.trim().is_empty() {
            anyhow::bail!("model name cannot be empty");
        }
        if self.dimension == 0 {
            anyhow::bail!("dimension must be greater than 0");
        }
        if self.max_seq_length == 0 {
            anyhow::bail!("max sequence length must be greater than 0");
        }
        if self.intra_threads == 0 {
            anyhow::bail!("intra threads must be greater than 0");
        }
        Ok(())
    }

    /// Resolves the bind address. Accepts IP literals (bare IPv6 included)
    /// and host names such as `localhost`; the first resolved address wins.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))?
            .next()
            .with_context(|| format!("No address found for {}", self.host))
    }

    pub fn model_source(&self) -> ModelSource {
        match &self.model_dir {
            Some(dir) => ModelSource::Local { dir: dir.clone() },
            None => ModelSource::Hub {
                repo_id: self.model.clone(),
                cache_dir: self.cache_dir.clone(),
            },
        }
    }

    pub fn model_options(&self) -> OnnxModelOptions {
        OnnxModelOptions {
            dimension: self.dimension,
            max_seq_length: self.max_seq_length,
            intra_threads: self.intra_threads,
        }
    }
}

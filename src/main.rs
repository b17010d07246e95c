// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use ats_semantic_service::{
    api::{start_server, AppState},
    config::ServiceConfig,
    embeddings::ModelHolder,
    version,
};
use clap::Parser;
use std::{env, sync::Arc};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = ServiceConfig::parse();
    config.validate()?;
    let addr = config.socket_addr()?;

    info!("{}", "=".repeat(60));
    info!("{}", version::get_version_string());
    info!("{}", "=".repeat(60));

    // The model must be in place before the listener is bound
    let holder = Arc::new(ModelHolder::new(config.model.clone()));
    if let Err(e) = holder
        .load(&config.model_source(), config.model_options())
        .await
    {
        error!("Failed to load model: {:#}", e);
        error!("Exiting.");
        std::process::exit(1);
    }

    info!("Starting server on http://{}", addr);
    info!("Press CTRL+C to stop the server");

    start_server(addr, AppState::new(holder)).await
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use captcha_ocr_node::{api::start_server, config::NodeConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting CAPTCHA OCR Node...\n");
    println!("📦 BUILD VERSION: {}", captcha_ocr_node::version::VERSION);
    println!();

    let config = NodeConfig::from_env();
    tracing::info!(
        "Configured: listen_addr={}, max_upload_bytes={}, budget={}s, model={}",
        config.listen_addr,
        config.max_upload_bytes,
        config.processing_budget.as_secs(),
        config.model_path.display()
    );

    start_server(config)
        .await
        .map_err(|e| anyhow::anyhow!("API server failed: {}", e))?;

    Ok(())
}

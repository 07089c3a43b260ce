//! Spinrank game server.

mod cli;
mod logging;

use std::path::Path;

use clap::Parser;
use spinrank::prelude::*;

use crate::cli::Args;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    logging::setup_logging(&args.log_level, args.json_logs)?;

    let config = args.server_config();
    tracing::info!(
        bind = %config.bind_addr,
        origins = ?config.origins,
        handshake_timeout = ?config.handshake_timeout,
        idle_timeout = ?config.idle_timeout,
        enforce_wheel = config.room.enforce_wheel_values,
        "starting Spinrank server"
    );

    let server = SpinrankServer::builder()
        .config(config)
        .prompts(load_prompts(&args.prompts))
        .build()
        .await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutdown signal received"),
    }
    Ok(())
}

/// Loads the prompt file, falling back to the built-in prompts when it is
/// missing or unusable.
fn load_prompts(path: &Path) -> PromptPool {
    match PromptPool::from_file(path) {
        Ok(pool) => {
            tracing::info!(path = %path.display(), prompts = pool.len(), "loaded prompts");
            pool
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "using built-in prompts");
            PromptPool::default()
        }
    }
}

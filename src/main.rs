//! Binary entry point for the URL validation pipeline.
//!
//! Initializes logging, loads configuration, and starts the workers.

use anyhow::Result;
use shortguard::{config, runtime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Failed to load .env: {} (using system environment)", e);
    }

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let cfg = config::load_from_env()?;

    match cfg.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    tracing::info!(
        workers = %cfg.validation_workers,
        work_queue = %cfg.safebrowsing.work_queue,
        result_queue = %cfg.safebrowsing.result_queue,
        "Configuration loaded"
    );

    tracing::info!("Starting shortguard");

    runtime::run(cfg).await
}

use anyhow::{Context, Result};
use math_notes::{config, server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Picks the log filter: `RUST_LOG` when set, the configured level otherwise.
/// Full directives such as `math_notes=debug,tower_http=info` are accepted.
fn log_filter(rust_log: Option<String>, configured: &str) -> Result<(String, EnvFilter)> {
    let directives = rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| configured.to_string());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter '{directives}'"))?;
    Ok((directives, filter))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()
        .await
        .context("Failed to load configuration")?;

    let (directives, filter) = log_filter(
        std::env::var("RUST_LOG").ok(),
        &config.server.logs.level,
    )?;
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!(
        log_filter = %directives,
        vision_model = %config.vision.model,
        solver_model = %config.solver.model,
        temp_dir = %config.storage.temp_dir,
        image_delivery = ?config.recognition.image_delivery,
        "Starting math notes gateway"
    );

    server::run(config).await?;

    Ok(())
}

//! Gatto bot entry point.
//!
//! Loads configuration from `GATTO_CONFIG` (optional TOML) and the
//! environment, then runs until interrupted.

use gatto::BotConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("gatto-bot starting");

    let config = BotConfig::load()?;
    gatto::runtime::run(config).await?;

    tracing::info!("gatto-bot stopped");
    Ok(())
}

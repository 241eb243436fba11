/// Wishwall - birthday wishes service
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wishwall::{
    config::{AppConfig, LoggingConfig},
    context::AppContext,
    server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    init_logging(&config.logging);

    tracing::info!("Wishwall v{}", env!("CARGO_PKG_VERSION"));

    let ctx = AppContext::new(config)
        .await
        .context("Failed to initialize application context")?;

    server::serve(ctx).await?;

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("wishwall={0},tower_http={0}", logging.level).into());
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

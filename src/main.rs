use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use stockbrief::{desk, AppConfig, AppState, OpenRouterClient, ReportCache, Result};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stockbrief=info")),
        )
        .init();

    let config = AppConfig::from_env_or_file("stockbrief.toml")?;
    let model = Arc::new(OpenRouterClient::from_config(&config.model)?);
    let pipeline = Arc::new(desk::research_pipeline(model, &config)?);
    let cache = Arc::new(ReportCache::new());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|err| stockbrief::BriefError::Config(format!("invalid listen address: {err}")))?;

    tracing::info!(%addr, pipeline = pipeline.name(), "serving investment briefs");
    stockbrief::serve(AppState::new(pipeline, cache), addr).await
}

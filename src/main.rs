use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use news_monitor_backend::app;
use news_monitor_backend::config::ServerConfig;
use news_monitor_backend::db;
use news_monitor_backend::logging::{init_logging, LoggingConfig};
use news_monitor_backend::services::news_provider::{PerplexityProvider, ProviderConfig};
use news_monitor_backend::services::news_service::{NewsConfig, NewsService};
use news_monitor_backend::services::pacing::FixedIntervalPacer;
use news_monitor_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env()?)?;

    let server_config = ServerConfig::from_env()?;
    let provider_config = ProviderConfig::from_env()?;
    let news_config = NewsConfig::from_env()?;

    let pool = db::connect(&server_config.database_url, server_config.database_max_connections)
        .await
        .with_context(|| format!("failed to open database {}", server_config.database_url))?;

    let provider = PerplexityProvider::new(provider_config)?;
    let pacer = FixedIntervalPacer::new(news_config.pacing_delay);
    let news_service = NewsService::new(news_config, Arc::new(provider), Arc::new(pacer));

    let state = AppState {
        pool,
        news_service: Arc::new(news_service),
    };
    let app = app::create_app(state, &server_config);

    let listener = TcpListener::bind(server_config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", server_config.bind_addr))?;
    info!("News monitor backend running at http://{}/", server_config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{Level, info};

use dashboard::client::ApiClient;
use dashboard::config::DashboardConfig;
use dashboard::state::AppState;
use dashboard::views::Views;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = DashboardConfig::load().context("Failed to load configuration")?;

    let state = AppState {
        api: ApiClient::new(&config.api).context("Failed to build API client")?,
        views: Arc::new(Views::new().context("Failed to compile templates")?),
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    info!(api = %config.api.base_url, "Dashboard running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, dashboard::build_router(state)).await?;

    Ok(())
}

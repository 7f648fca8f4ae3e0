use std::net::SocketAddr;

use anyhow::Context;

use stockroom_api::{build_app, AppState};
use stockroom_infra::{identity_provider, Config, Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = Config::from_env().context("loading configuration")?;
    tracing::debug!(bind_addr = %config.bind_addr, identity = ?config.identity, "configuration loaded");
    if let Some(frontend) = &config.frontend_url {
        tracing::info!(frontend_url = %frontend, "expecting browser traffic from frontend");
    }

    let stores = Stores::from_config(&config).await.context("initializing stores")?;
    let provider = identity_provider(&config).context("initializing identity provider")?;
    let state = AppState::new(provider, stores, config.identity_timeout, config.low_stock_threshold);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

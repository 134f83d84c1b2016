use anyhow::{Context, Result};
use std::sync::Arc;
use subharvest::api::{router, AppState};
use subharvest::store::open_store;
use subharvest::{init_tracing_once, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing_once();
    let config = ServiceConfig::from_env()?;

    let store = open_store(&config.store_uri, &config.db_name).await?;
    info!("Connected to {}", store.describe());

    let app = router(Arc::new(AppState::new(store.clone())));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("server error")?;

    store.close().await?;
    info!("Disconnected");
    Ok(())
}

use std::sync::Arc;

use anyhow::Context;

use codecamp_api::{app, version};
use codecamp_infra::ConfigHandle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    codecamp_observability::init();

    let handle = Arc::new(ConfigHandle::from_env().context("loading configuration")?);
    let config = handle.current()?;
    let default_version = version::negotiate(&config.default_api_version)
        .context("CODECAMP_DEFAULT_API_VERSION")?;

    let services = app::services::build_services(&config, handle.clone())
        .await
        .context("preparing camp store")?;
    let router = app::build_app(Arc::new(services), default_version);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, %default_version, "listening");

    axum::serve(listener, router).await?;
    Ok(())
}

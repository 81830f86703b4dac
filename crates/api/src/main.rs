use anyhow::Context;

use analytics_infra::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    analytics_observability::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(e.into());
        }
    };

    let app = analytics_api::app::build_app(&config)
        .await
        .context("failed to initialize event store")?;

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

use anyhow::Context;
use axum::http::HeaderValue;
use pricebook_lakehouse::Catalog;
use pricebook_server::{router, AppState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pricebook_server=debug,pricebook_lakehouse=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let cors_origin = HeaderValue::from_str(&config.cors_origin)
        .with_context(|| format!("invalid PRICEBOOK_CORS_ORIGIN: {}", config.cors_origin))?;

    let catalog = Catalog::open(config.catalog, &config.events)
        .await
        .context("failed to open catalog")?;
    let app = router(AppState::from(catalog), cors_origin);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Pricebook HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

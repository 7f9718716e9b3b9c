/// API сервер классификатора намерения покупки

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use purchase_intent::{router, Config, ServiceContext};

#[tokio::main]
async fn main() -> Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("purchase_intent=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    tracing::info!("Starting with model directory {}", config.model_dir.display());

    let ctx = ServiceContext::from_config(&config).await?;
    let app = router(ctx);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

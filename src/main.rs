use facturx_embed::server::{ServiceConfig, app};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "facturx_embed=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;
    if config.token.is_none() {
        warn!("FACTURX_TOKEN is not set, every /embed request will fail");
    }

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(address = %config.bind, "facturx-embed listening");

    axum::serve(listener, app(config)).await?;
    Ok(())
}

use std::sync::Arc;

use follow_lens::{
    api::{create_router, AppState},
    config::Config,
    services::providers::{AniListProvider, MediaService},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("follow_lens=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Initialize application state
    let provider: Arc<dyn MediaService> = Arc::new(AniListProvider::new(&config));
    tracing::info!(
        provider = provider.name(),
        media_type = %config.media_type,
        "Media service configured"
    );
    let state = AppState::new(provider, config.engine_settings());

    // Create the router with all routes
    let app = create_router(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

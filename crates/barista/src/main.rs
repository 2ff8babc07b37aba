//! The streaming proxy server binary.

#[macro_use]
extern crate tracing;

use barista::server::{AppState, ServerConfig, router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set, chat requests will fail");
    }

    let state = AppState::from_config(&config);
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {}: {err}", config.addr);
            return;
        }
    };
    info!("barista listening on http://{}", config.addr);

    if let Err(err) = axum::serve(listener, app).await {
        error!("server error: {err}");
    }
}

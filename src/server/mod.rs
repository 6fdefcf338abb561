pub mod handlers;
mod types;

pub use handlers::AppState;
pub use types::MessageResponse;

use crate::{
    Result,
    analysis::Analyzer,
    config::Config,
    limiter::RateLimiter,
    model::create_model_client,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub fn router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/ping", get(handlers::ping))
        .route("/api/analyze", post(handlers::analyze))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    // Initialize rate limiter and its window timers
    let limiter = Arc::new(RateLimiter::new(&config.limits));
    let _window_resets = limiter.spawn_window_resets();

    // Initialize model gateway and analyzer
    let model = create_model_client(&config.model)?;
    let analyzer = Analyzer::new(
        limiter,
        model,
        config.model.timeout_secs.map(Duration::from_secs),
    );

    let app_state = AppState {
        analyzer: Arc::new(analyzer),
        trusted_proxies: config.limits.trusted_proxies.clone().into(),
    };
    let app = router(app_state, config.server.body_limit_bytes);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub mod app_state;
pub mod config;
pub mod error;
pub mod forwarder;
pub mod middleware;
pub mod payload;
pub mod receiver;
pub mod routes;

use axum::Router;
use axum::extract::Extension;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

//
// Re-export
//
pub use app_state::AppState;
pub use config::Config;
pub use error::RelayError;
pub use forwarder::{API_KEY_HEADER, ForwarderConfig, PayloadForwarder};
pub use payload::{GenerateThumbnailBody, GenerationRequest, OutboundPayload};
pub use receiver::RequestReceiver;

pub const GENERATE_ROUTE: &str = "/api/thumbnail/generate";

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(GENERATE_ROUTE, post(routes::generate_thumbnail))
        .route("/health", get(routes::health))
        .layer(axum::middleware::from_fn(middleware::log_relay_outcome))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(state))
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(&config)?;
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.listen_on_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Thumbnail relay listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Thumbnail relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

//! HTTP front end: JSON endpoints over the nearby-search pipeline.

mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::location::Geolocator;
use crate::oracle::PlaceOracle;

pub use handlers::{ApiError, NearbyResponse, PlaceView};
pub use state::{AppState, ResultCache, RESULT_CACHE_CAPACITY};

pub fn build_router(oracle: Arc<dyn PlaceOracle>, geolocator: Option<Arc<dyn Geolocator>>) -> Router {
    let state = Arc::new(AppState::new(oracle, geolocator));

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/locate", get(handlers::locate))
        .route("/api/nearby", get(handlers::nearby))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(
    addr: SocketAddr,
    oracle: Arc<dyn PlaceOracle>,
    geolocator: Option<Arc<dyn Geolocator>>,
) -> std::io::Result<()> {
    let app = build_router(oracle, geolocator);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Wayfarer server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutting down");
}

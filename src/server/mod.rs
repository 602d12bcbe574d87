//! HTTP surface of the service.
//!
//! Every handler answers with a structured JSON body: provider failures are
//! folded into fallbacks below this layer, and a panic inside a handler is
//! turned into a generic 500 by [`CatchPanicLayer`].

pub mod dto;
pub mod error;
pub mod handlers;

use crate::domain::error::DomainError;
use crate::BullsAi;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use error::GENERIC_ERROR_MESSAGE;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(app: Arc<BullsAi>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat))
        .route("/api/stock-data/{symbol}", get(handlers::stock_data))
        .route("/api/historical-data", get(handlers::historical_data))
        .route("/api/analyze-document", post(handlers::analyze_document))
        .route("/api/sessions/{session_id}", delete(handlers::evict_session))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// CORS for the browser frontend at `origin`, with credentials.
pub fn cors(origin: &str) -> Result<CorsLayer, DomainError> {
    let origin = HeaderValue::from_str(origin)
        .map_err(|e| DomainError::Config(format!("invalid CORS origin {origin:?}: {e}")))?;

    // Wildcards are not allowed together with credentials; mirror the request instead.
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

pub async fn serve(app: Arc<BullsAi>, addr: SocketAddr, cors_origin: &str) -> Result<(), DomainError> {
    let app = router(app).layer(cors(cors_origin)?);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, cors_origin, "BullsAI API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = detail, "request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": GENERIC_ERROR_MESSAGE })),
    )
        .into_response()
}

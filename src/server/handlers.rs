use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use std::sync::Arc;

use super::dto::*;
use super::error::ApiError;
use crate::BullsAi;

const STOCK_SERVICE_UNAVAILABLE: &str = "Stock service not available";

/// GET /
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to BullsAI - Your AI Stock Analysis Assistant",
    })
}

/// GET /health
pub async fn health(State(app): State<Arc<BullsAi>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "BullsAI Backend",
        ai_service: app.ai_service_available(),
        stock_service: app.stock_service_available(),
    })
}

/// POST /api/chat
pub async fn chat(
    State(app): State<Arc<BullsAi>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload?;
    let session_id = req.session_id().to_string();
    tracing::info!(session_id = %session_id, message_len = req.message.len(), "chat request");

    let reply = app.chat(&req.message, &session_id).await;

    Ok(Json(ChatResponse {
        response: reply.response,
        session_id,
        intent: reply.intent,
    }))
}

/// GET /api/stock-data/{symbol}. The path symbol is ignored; the service is
/// bound to one ticker.
pub async fn stock_data(State(app): State<Arc<BullsAi>>, Path(symbol): Path<String>) -> Json<StockDataResponse> {
    tracing::debug!(requested = %symbol, "stock data request");

    Json(match app.stock_overview().await {
        Some(overview) => StockDataResponse {
            success: true,
            data: Some(overview),
            error: None,
        },
        None => StockDataResponse {
            success: false,
            data: None,
            error: Some(STOCK_SERVICE_UNAVAILABLE.to_string()),
        },
    })
}

/// GET /api/historical-data?period=&interval=
pub async fn historical_data(
    State(app): State<Arc<BullsAi>>,
    Query(q): Query<HistoricalQuery>,
) -> Json<HistoricalResponse> {
    let period = q.period.unwrap_or_else(|| DEFAULT_PERIOD.to_string());
    let interval = q.interval.unwrap_or_else(|| DEFAULT_INTERVAL.to_string());

    let (success, data, error) = match app.historical(&period, &interval).await {
        Some(bars) => (true, Some(bars), None),
        None => (false, None, Some(STOCK_SERVICE_UNAVAILABLE.to_string())),
    };

    Json(HistoricalResponse {
        success,
        data,
        period,
        interval,
        error,
    })
}

/// POST /api/analyze-document?file_url=
pub async fn analyze_document(Query(q): Query<AnalyzeDocumentQuery>) -> Json<AnalyzeDocumentResponse> {
    Json(AnalyzeDocumentResponse {
        message: "Document analysis coming soon",
        file_url: q.file_url,
    })
}

/// DELETE /api/sessions/{session_id}
pub async fn evict_session(
    State(app): State<Arc<BullsAi>>,
    Path(session_id): Path<String>,
) -> Result<Json<EvictResponse>, ApiError> {
    let evicted = app.evict_session(&session_id).await?;
    tracing::info!(session_id = %session_id, evicted, "session evicted");
    Ok(Json(EvictResponse { session_id, evicted }))
}

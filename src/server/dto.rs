use crate::application::stock_data::StockOverview;
use crate::domain::entities::bar::HistoricalBar;
use crate::domain::values::intent::IntentFlags;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SESSION_ID: &str = "default";
pub const DEFAULT_PERIOD: &str = "1mo";
pub const DEFAULT_INTERVAL: &str = "1d";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn session_id(&self) -> &str {
        self.session_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SESSION_ID)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub intent: Option<IntentFlags>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub ai_service: bool,
    pub stock_service: bool,
}

#[derive(Debug, Serialize)]
pub struct StockDataResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StockOverview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoricalQuery {
    pub period: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoricalResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<HistoricalBar>>,
    pub period: String,
    pub interval: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeDocumentQuery {
    pub file_url: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeDocumentResponse {
    pub message: &'static str,
    pub file_url: String,
}

#[derive(Debug, Serialize)]
pub struct EvictResponse {
    pub session_id: String,
    pub evicted: bool,
}

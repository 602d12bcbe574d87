use crate::domain::entities::bar::HistoricalBar;
use crate::domain::entities::fundamentals::{AnalystRecommendations, FinancialMetrics};
use crate::domain::entities::quote::QuoteSnapshot;
use async_trait::async_trait;
use thiserror::Error;

/// Why a market-data operation produced no payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Transport failure: DNS, connect, timeout.
    #[error("network error: {0}")]
    Network(String),

    /// Provider answered with a non-success HTTP status.
    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Provider answered successfully but had nothing for the request.
    #[error("no data: {0}")]
    NoData(String),
}

impl GatewayError {
    /// "Nothing to report" rather than a provider fault.
    pub fn is_no_data(&self) -> bool {
        matches!(self, GatewayError::NoData(_))
    }
}

/// Read-only access to quote, history and fundamentals for one fixed ticker.
///
/// Every operation reports failure through [`GatewayError`]. Fallback values
/// are the caller's choice, see `application::stock_data`.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Ticker this gateway is bound to.
    fn symbol(&self) -> &str;

    async fn quote_snapshot(&self) -> Result<QuoteSnapshot, GatewayError>;

    /// `period` and `interval` are forwarded to the provider unchanged
    /// (e.g. `"1mo"`, `"1d"`).
    async fn historical(&self, period: &str, interval: &str) -> Result<Vec<HistoricalBar>, GatewayError>;

    async fn financial_metrics(&self) -> Result<FinancialMetrics, GatewayError>;

    async fn analyst_recommendations(&self) -> Result<AnalystRecommendations, GatewayError>;
}

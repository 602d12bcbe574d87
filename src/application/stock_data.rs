use crate::domain::entities::bar::HistoricalBar;
use crate::domain::entities::fundamentals::{AnalystRecommendations, FinancialMetrics};
use crate::domain::entities::quote::{PriceData, UnavailableQuote};
use crate::domain::ports::market_data::{GatewayError, MarketDataGateway};
use serde::Serialize;
use std::sync::Arc;

/// Combined payload of the stock-data endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StockOverview {
    pub price_data: PriceData,
    pub financial_metrics: FinancialMetrics,
    pub analyst_recommendations: AnalystRecommendations,
}

/// Market data with fallbacks applied: callers always get a payload.
pub struct StockDataUseCase {
    gateway: Arc<dyn MarketDataGateway>,
}

impl StockDataUseCase {
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self { gateway }
    }

    /// Live quote, or the fixed unavailable record.
    pub async fn price_data(&self) -> PriceData {
        match self.gateway.quote_snapshot().await {
            Ok(quote) => PriceData::Live(Box::new(quote)),
            Err(e) => {
                self.log_fallback("quote_snapshot", &e);
                PriceData::Unavailable(UnavailableQuote::new(self.gateway.symbol()))
            }
        }
    }

    pub async fn financial_metrics(&self) -> FinancialMetrics {
        self.gateway.financial_metrics().await.unwrap_or_else(|e| {
            self.log_fallback("financial_metrics", &e);
            FinancialMetrics::default()
        })
    }

    pub async fn analyst_recommendations(&self) -> AnalystRecommendations {
        self.gateway.analyst_recommendations().await.unwrap_or_else(|e| {
            self.log_fallback("analyst_recommendations", &e);
            AnalystRecommendations::default()
        })
    }

    /// Quote, ratios and analyst data fetched concurrently.
    pub async fn overview(&self) -> StockOverview {
        let (price_data, financial_metrics, analyst_recommendations) = tokio::join!(
            self.price_data(),
            self.financial_metrics(),
            self.analyst_recommendations(),
        );

        tracing::debug!(
            live_quote = price_data.is_live(),
            has_ratios = !financial_metrics.is_empty(),
            has_analysts = !analyst_recommendations.is_empty(),
            "stock overview assembled"
        );

        StockOverview {
            price_data,
            financial_metrics,
            analyst_recommendations,
        }
    }

    /// Historical bars, or an empty series.
    pub async fn historical(&self, period: &str, interval: &str) -> Vec<HistoricalBar> {
        self.gateway
            .historical(period, interval)
            .await
            .unwrap_or_else(|e| {
                self.log_fallback("historical", &e);
                vec![]
            })
    }

    fn log_fallback(&self, operation: &str, error: &GatewayError) {
        if error.is_no_data() {
            tracing::info!(provider = self.gateway.name(), operation, %error, "no data, using fallback");
        } else {
            tracing::warn!(provider = self.gateway.name(), operation, %error, "market data call failed, using fallback");
        }
    }
}

use crate::domain::ports::market_data::MarketDataGateway;
use crate::domain::values::intent::IntentFlags;
use std::sync::Arc;

/// Query fragments that pull in market data even when no intent flag is set.
pub const ALWAYS_FETCH_TERMS: &[&str] = &["price", "stock", "tata power"];

pub const DATA_UNAVAILABLE_NOTICE: &str = "\n\n(Note: Real-time stock data is temporarily unavailable)";

/// Builds the market-data block appended to the model's system instructions.
pub struct ContextAssembler {
    gateway: Option<Arc<dyn MarketDataGateway>>,
}

impl ContextAssembler {
    /// `gateway` is `None` when the market-data service failed to start; the
    /// assembled context is then always empty.
    pub fn new(gateway: Option<Arc<dyn MarketDataGateway>>) -> Self {
        Self { gateway }
    }

    pub fn should_fetch(query: &str, intent: &IntentFlags) -> bool {
        if intent.any() {
            return true;
        }
        let query = query.to_lowercase();
        ALWAYS_FETCH_TERMS.iter().any(|t| query.contains(t))
    }

    /// Returns an empty string when no data is needed. Never fails: a quote
    /// failure yields [`DATA_UNAVAILABLE_NOTICE`].
    pub async fn build_context(&self, query: &str, intent: &IntentFlags) -> String {
        let Some(gateway) = &self.gateway else {
            return String::new();
        };
        if !Self::should_fetch(query, intent) {
            return String::new();
        }

        let quote = match gateway.quote_snapshot().await {
            Ok(quote) => quote,
            Err(e) => {
                tracing::warn!(provider = gateway.name(), error = %e, "quote fetch failed, continuing without market data");
                return DATA_UNAVAILABLE_NOTICE.to_string();
            }
        };

        let mut context = format!("\n\nCurrent Stock Data:\n{}", quote.format_for_chat());

        if intent.needs_financial_data {
            match gateway.financial_metrics().await {
                Ok(metrics) if !metrics.is_empty() => match serde_json::to_string_pretty(&metrics) {
                    Ok(json) => {
                        context.push_str("\n\nFinancial Metrics:\n");
                        context.push_str(&json);
                    }
                    Err(e) => tracing::warn!(error = %e, "could not serialize financial metrics"),
                },
                Ok(_) => tracing::debug!("no financial metrics reported"),
                Err(e) => {
                    tracing::warn!(provider = gateway.name(), error = %e, "financial metrics unavailable, omitting ratio block");
                }
            }
        }

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::intent::classify;

    #[test]
    fn test_should_fetch_on_any_intent() {
        assert!(ContextAssembler::should_fetch("latest news", &classify("latest news")));
    }

    #[test]
    fn test_should_fetch_on_always_terms() {
        for q in ["What's the PRICE?", "tell me about this stock", "Tata Power please"] {
            let intent = classify(q);
            assert!(!intent.any(), "{q:?} should not set intent flags");
            assert!(ContextAssembler::should_fetch(q, &intent), "{q:?}");
        }
    }

    #[test]
    fn test_no_fetch_for_small_talk() {
        assert!(!ContextAssembler::should_fetch("hello", &classify("hello")));
    }

    #[tokio::test]
    async fn test_no_gateway_means_empty_context() {
        let assembler = ContextAssembler::new(None);
        let q = "What is the P/E ratio?";
        assert_eq!(assembler.build_context(q, &classify(q)).await, "");
    }
}

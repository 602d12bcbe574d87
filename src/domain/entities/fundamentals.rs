use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key financial ratios. Margins, growth and return ratios are percent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub revenue_growth: Option<f64>,
    pub profit_margins: Option<f64>,
    pub operating_margins: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub book_value: Option<f64>,
    pub price_to_book: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub ev_to_revenue: Option<f64>,
    pub ev_to_ebitda: Option<f64>,
}

impl FinancialMetrics {
    /// True when the provider reported none of the ratios.
    pub fn is_empty(&self) -> bool {
        *self == FinancialMetrics::default()
    }
}

/// Aggregated analyst opinion for the tracked equity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalystRecommendations {
    /// Count per grade (`strongBuy`, `buy`, `hold`, `sell`, `strongSell`).
    /// Grades with no analysts are omitted.
    pub recommendation_counts: BTreeMap<String, u32>,
    pub target_mean_price: Option<f64>,
    pub target_high_price: Option<f64>,
    pub target_low_price: Option<f64>,
    pub number_of_analysts: Option<u32>,
}

impl AnalystRecommendations {
    pub fn is_empty(&self) -> bool {
        *self == AnalystRecommendations::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metrics_are_empty() {
        assert!(FinancialMetrics::default().is_empty());
        let m = FinancialMetrics {
            current_ratio: Some(0.0),
            ..Default::default()
        };
        // A reported zero is still a value.
        assert!(!m.is_empty());
    }

    #[test]
    fn test_metrics_serialize_absent_as_null() {
        let json = serde_json::to_value(FinancialMetrics::default()).unwrap();
        assert!(json["revenue_growth"].is_null());
        assert!(json["ev_to_ebitda"].is_null());
    }

    #[test]
    fn test_recommendations_empty() {
        let mut r = AnalystRecommendations::default();
        assert!(r.is_empty());
        r.recommendation_counts.insert("buy".into(), 4);
        assert!(!r.is_empty());
    }
}

//! Keyword-based query intent classification.
//!
//! A query is lower-cased and checked against five keyword tables. Each flag is
//! set when at least one keyword of its table occurs as a substring. Flags are
//! independent: a single query may set several of them.

use serde::{Deserialize, Serialize};

const FINANCIAL_KEYWORDS: &[&str] = &[
    "revenue",
    "profit",
    "earnings",
    "pe",
    "ratio",
    "financial",
    "balance sheet",
    "income",
];
const NEWS_KEYWORDS: &[&str] = &["news", "latest", "recent", "announcement", "update"];
const TECHNICAL_KEYWORDS: &[&str] = &["chart", "technical", "resistance", "support", "trend", "pattern"];
const COMPARISON_KEYWORDS: &[&str] = &["compare", "versus", "vs", "peer", "competitor"];
const FORECAST_KEYWORDS: &[&str] = &["forecast", "predict", "future", "target", "potential", "growth"];

/// Topic flags computed for a single query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentFlags {
    pub needs_financial_data: bool,
    pub needs_news: bool,
    pub needs_technical: bool,
    pub needs_comparison: bool,
    pub needs_forecast: bool,
}

impl IntentFlags {
    pub fn any(&self) -> bool {
        self.needs_financial_data
            || self.needs_news
            || self.needs_technical
            || self.needs_comparison
            || self.needs_forecast
    }
}

/// Keyword lists for each intent category.
///
/// Deserializable so operators can replace the defaults from a JSON file.
/// Categories omitted from the file keep their default keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTable {
    pub financial: Vec<String>,
    pub news: Vec<String>,
    pub technical: Vec<String>,
    pub comparison: Vec<String>,
    pub forecast: Vec<String>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        fn owned(words: &[&str]) -> Vec<String> {
            words.iter().map(|w| w.to_string()).collect()
        }

        Self {
            financial: owned(FINANCIAL_KEYWORDS),
            news: owned(NEWS_KEYWORDS),
            technical: owned(TECHNICAL_KEYWORDS),
            comparison: owned(COMPARISON_KEYWORDS),
            forecast: owned(FORECAST_KEYWORDS),
        }
    }
}

impl KeywordTable {
    /// Lower-case every keyword and drop empty ones. An empty keyword would
    /// match every query.
    pub fn normalized(mut self) -> Self {
        for list in [
            &mut self.financial,
            &mut self.news,
            &mut self.technical,
            &mut self.comparison,
            &mut self.forecast,
        ] {
            *list = list
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect();
        }
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    keywords: KeywordTable,
}

impl IntentClassifier {
    pub fn new(keywords: KeywordTable) -> Self {
        Self {
            keywords: keywords.normalized(),
        }
    }

    pub fn classify(&self, query: &str) -> IntentFlags {
        let query = query.to_lowercase();

        IntentFlags {
            needs_financial_data: contains_any(&query, &self.keywords.financial),
            needs_news: contains_any(&query, &self.keywords.news),
            needs_technical: contains_any(&query, &self.keywords.technical),
            needs_comparison: contains_any(&query, &self.keywords.comparison),
            needs_forecast: contains_any(&query, &self.keywords.forecast),
        }
    }
}

fn contains_any(haystack: &str, words: &[String]) -> bool {
    words.iter().any(|w| haystack.contains(w.as_str()))
}

/// Classify with the default keyword tables.
pub fn classify(query: &str) -> IntentFlags {
    IntentClassifier::default().classify(query)
}

use crate::domain::error::DomainError;
use crate::domain::values::intent::KeywordTable;
use crate::infrastructure::completions::openai::PLACEHOLDER_API_KEY;
use crate::infrastructure::feeds::yahoo::YahooEndpoints;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SYMBOL: &str = "TATAPOWER.NS";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime settings read from the environment (and `.env`, loaded by `main`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: String,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub symbol: String,
    pub yahoo_chart_url: Option<String>,
    pub yahoo_summary_url: Option<String>,
    pub yahoo_cookie_url: Option<String>,
    pub yahoo_crumb_url: Option<String>,
    pub http_timeout: Duration,
    pub cors_origin: String,
    pub keywords_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: PLACEHOLDER_API_KEY.to_string(),
            openai_model: None,
            openai_base_url: None,
            symbol: DEFAULT_SYMBOL.to_string(),
            yahoo_chart_url: None,
            yahoo_summary_url: None,
            yahoo_cookie_url: None,
            yahoo_crumb_url: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            keywords_file: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key/value source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let openai_api_key = match get("OPENAI_API_KEY") {
            Some(key) => key,
            None => {
                tracing::warn!("OPENAI_API_KEY not set; add OPENAI_API_KEY=your-key-here to .env to enable AI analysis");
                defaults.openai_api_key
            }
        };

        let http_timeout = match get("BULLSAI_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    DomainError::Config(format!("BULLSAI_HTTP_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"))
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.http_timeout,
        };

        Ok(Self {
            openai_api_key,
            openai_model: get("OPENAI_MODEL"),
            openai_base_url: get("OPENAI_BASE_URL"),
            symbol: get("BULLSAI_SYMBOL").unwrap_or(defaults.symbol),
            yahoo_chart_url: get("YAHOO_CHART_URL"),
            yahoo_summary_url: get("YAHOO_SUMMARY_URL"),
            yahoo_cookie_url: get("YAHOO_COOKIE_URL"),
            yahoo_crumb_url: get("YAHOO_CRUMB_URL"),
            http_timeout,
            cors_origin: get("BULLSAI_CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            keywords_file: get("BULLSAI_KEYWORDS_FILE").map(PathBuf::from),
        })
    }

    /// Yahoo endpoints with any configured overrides applied.
    pub fn yahoo_endpoints(&self) -> YahooEndpoints {
        let defaults = YahooEndpoints::default();
        YahooEndpoints {
            chart: self.yahoo_chart_url.clone().unwrap_or(defaults.chart),
            summary: self.yahoo_summary_url.clone().unwrap_or(defaults.summary),
            cookie: self.yahoo_cookie_url.clone().unwrap_or(defaults.cookie),
            crumb: self.yahoo_crumb_url.clone().unwrap_or(defaults.crumb),
        }
    }

    /// Keyword tables from `keywords_file`, or the built-in defaults.
    pub fn load_keywords(&self) -> Result<KeywordTable, DomainError> {
        let Some(path) = &self.keywords_file else {
            return Ok(KeywordTable::default());
        };
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("reading {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| DomainError::Config(format!("parsing {}: {e}", path.display())))
    }
}

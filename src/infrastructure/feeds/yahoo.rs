use super::{get_json, MAX_ERROR_BODY};
use crate::domain::entities::bar::HistoricalBar;
use crate::domain::entities::fundamentals::{AnalystRecommendations, FinancialMetrics};
use crate::domain::entities::quote::{round2, QuoteSnapshot, DEFAULT_COMPANY_NAME};
use crate::domain::error::DomainError;
use crate::domain::ports::market_data::{GatewayError, MarketDataGateway};
use async_trait::async_trait;
use chrono::DateTime;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const DEFAULT_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";
pub const DEFAULT_CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

const QUOTE_MODULES: &str = "price,summaryDetail,defaultKeyStatistics";
const METRICS_MODULES: &str = "financialData,defaultKeyStatistics";
const RECOMMENDATION_MODULES: &str = "recommendationTrend,financialData";

/// Where the gateway sends each kind of request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YahooEndpoints {
    pub chart: String,
    pub summary: String,
    /// Sets the session cookie the crumb is bound to.
    pub cookie: String,
    pub crumb: String,
}

impl Default for YahooEndpoints {
    fn default() -> Self {
        Self {
            chart: DEFAULT_CHART_URL.to_string(),
            summary: DEFAULT_SUMMARY_URL.to_string(),
            cookie: DEFAULT_COOKIE_URL.to_string(),
            crumb: DEFAULT_CRUMB_URL.to_string(),
        }
    }
}

/// Yahoo Finance gateway for a single ticker.
///
/// Prices and bars come from the v8 chart API; valuation, ratios and analyst
/// data come from the v10 quoteSummary API. quoteSummary only answers requests
/// carrying a session cookie and the matching crumb, so the gateway performs
/// that handshake on first use and caches the crumb until Yahoo rejects it.
pub struct YahooGateway {
    symbol: String,
    endpoints: YahooEndpoints,
    client: reqwest::Client,
    crumb: Mutex<Option<String>>,
}

impl YahooGateway {
    pub fn new(symbol: String, endpoints: YahooEndpoints, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .user_agent(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                 AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/120.0.0.0 Safari/537.36",
            )
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Config(format!("HTTP client for Yahoo: {e}")))?;

        Ok(Self {
            symbol,
            endpoints,
            client,
            crumb: Mutex::new(None),
        })
    }

    async fn fetch_chart(&self, range: &str, interval: &str) -> Result<ChartData, GatewayError> {
        let url = format!("{}/{}", self.endpoints.chart.trim_end_matches('/'), self.symbol);
        let data: ChartResponse =
            get_json(&self.client, &url, &[("range", range), ("interval", interval)]).await?;

        if let Some(err) = data.chart.error {
            return Err(GatewayError::Parse(format!("Yahoo chart error: {err}")));
        }

        data.chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| GatewayError::NoData(format!("no chart results for {}", self.symbol)))
    }

    async fn fetch_summary(&self, modules: &str) -> Result<SummaryData, GatewayError> {
        let crumb = self.crumb().await?;
        let data = match self.summary_request(modules, &crumb).await {
            Err(GatewayError::Status { status: 401, .. }) => {
                tracing::debug!(symbol = %self.symbol, "crumb rejected, repeating handshake");
                let crumb = self.refresh_crumb(&crumb).await?;
                self.summary_request(modules, &crumb).await?
            }
            other => other?,
        };

        if let Some(err) = data.quote_summary.error {
            return Err(GatewayError::Parse(format!("Yahoo quoteSummary error: {err}")));
        }

        data.quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| GatewayError::NoData(format!("no summary for {}", self.symbol)))
    }

    async fn summary_request(&self, modules: &str, crumb: &str) -> Result<SummaryResponse, GatewayError> {
        let url = format!("{}/{}", self.endpoints.summary.trim_end_matches('/'), self.symbol);
        get_json(&self.client, &url, &[("modules", modules), ("crumb", crumb)]).await
    }

    async fn crumb(&self) -> Result<String, GatewayError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }
        let crumb = self.handshake().await?;
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    /// Replace `stale` with a fresh crumb, unless a concurrent request
    /// already did.
    async fn refresh_crumb(&self, stale: &str) -> Result<String, GatewayError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref().filter(|c| c.as_str() != stale) {
            return Ok(crumb.clone());
        }
        *cached = None;
        let crumb = self.handshake().await?;
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn handshake(&self) -> Result<String, GatewayError> {
        // The cookie endpoint answers 404 while still setting the cookie, so
        // only transport failures count here.
        self.client
            .get(&self.endpoints.cookie)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let resp = self
            .client
            .get(&self.endpoints.crumb)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let crumb = body.trim();
        if crumb.is_empty() || crumb.contains(char::is_whitespace) {
            return Err(GatewayError::Parse("Yahoo returned an unusable crumb".into()));
        }
        tracing::debug!(symbol = %self.symbol, "obtained Yahoo crumb");
        Ok(crumb.to_string())
    }
}

#[async_trait]
impl MarketDataGateway for YahooGateway {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    async fn quote_snapshot(&self) -> Result<QuoteSnapshot, GatewayError> {
        let chart = self.fetch_chart("5d", "1d").await?;
        let meta = &chart.meta;
        let closes: Vec<f64> = chart.quote().map(|q| q.close.iter().flatten().copied().collect()).unwrap_or_default();

        let price = meta
            .regular_market_price
            .or_else(|| closes.last().copied())
            .ok_or_else(|| GatewayError::NoData(format!("no price for {}", self.symbol)))?;

        let prev_close = if closes.len() > 1 {
            Some(closes[closes.len() - 2])
        } else {
            meta.chart_previous_close.or(meta.previous_close)
        };

        let name = meta
            .long_name
            .clone()
            .or_else(|| meta.short_name.clone())
            .unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string());

        let mut quote = QuoteSnapshot::new(meta.symbol.clone(), name, price).with_previous_close(prev_close);
        quote.day_high = meta.regular_market_day_high.map(round2);
        quote.day_low = meta.regular_market_day_low.map(round2);
        quote.volume = meta.regular_market_volume;
        quote.week_52_high = meta.fifty_two_week_high.map(round2);
        quote.week_52_low = meta.fifty_two_week_low.map(round2);

        // Valuation fields are best-effort: the chart alone is a usable quote.
        match self.fetch_summary(QUOTE_MODULES).await {
            Ok(summary) => apply_summary(&mut quote, &summary),
            Err(e) => {
                tracing::warn!(symbol = %self.symbol, error = %e, "quoteSummary unavailable, valuation fields left empty");
            }
        }

        Ok(quote)
    }

    async fn historical(&self, period: &str, interval: &str) -> Result<Vec<HistoricalBar>, GatewayError> {
        let chart = self.fetch_chart(period, interval).await?;
        let offset = chart.meta.gmtoffset.unwrap_or(0);
        let Some(quote) = chart.quote() else {
            return Ok(vec![]);
        };

        let mut bars = Vec::with_capacity(chart.timestamp.len());
        for (i, ts) in chart.timestamp.iter().enumerate() {
            let (Some(open), Some(high), Some(low), Some(close)) = (
                at(&quote.open, i),
                at(&quote.high, i),
                at(&quote.low, i),
                at(&quote.close, i),
            ) else {
                continue;
            };

            let Some(date) = DateTime::from_timestamp(ts + offset, 0) else {
                continue;
            };

            bars.push(HistoricalBar {
                date: date.format("%Y-%m-%d").to_string(),
                open: round2(open),
                high: round2(high),
                low: round2(low),
                close: round2(close),
                volume: at(&quote.volume, i),
            });
        }

        Ok(bars)
    }

    async fn financial_metrics(&self) -> Result<FinancialMetrics, GatewayError> {
        let summary = self.fetch_summary(METRICS_MODULES).await?;
        let fin = summary.financial_data.unwrap_or_default();
        let stats = summary.default_key_statistics.unwrap_or_default();

        Ok(FinancialMetrics {
            revenue_growth: percent(&fin.revenue_growth),
            profit_margins: percent(&fin.profit_margins),
            operating_margins: percent(&fin.operating_margins),
            return_on_equity: percent(&fin.return_on_equity),
            debt_to_equity: rounded(&fin.debt_to_equity),
            current_ratio: rounded(&fin.current_ratio),
            book_value: rounded(&stats.book_value),
            price_to_book: rounded(&stats.price_to_book),
            enterprise_value: raw(&stats.enterprise_value),
            ev_to_revenue: rounded(&stats.enterprise_to_revenue),
            ev_to_ebitda: rounded(&stats.enterprise_to_ebitda),
        })
    }

    async fn analyst_recommendations(&self) -> Result<AnalystRecommendations, GatewayError> {
        let summary = self.fetch_summary(RECOMMENDATION_MODULES).await?;
        let fin = summary.financial_data.unwrap_or_default();

        // Trend periods are "0m", "-1m", ...; prefer the current month.
        let mut counts = BTreeMap::new();
        if let Some(latest) = summary.recommendation_trend.and_then(|t| {
            let mut trend = t.trend;
            let idx = trend
                .iter()
                .position(|p| p.period.as_deref() == Some("0m"))
                .unwrap_or(0);
            (idx < trend.len()).then(|| trend.swap_remove(idx))
        }) {
            for (grade, n) in [
                ("strongBuy", latest.strong_buy),
                ("buy", latest.buy),
                ("hold", latest.hold),
                ("sell", latest.sell),
                ("strongSell", latest.strong_sell),
            ] {
                if let Some(n) = n.filter(|n| *n > 0) {
                    counts.insert(grade.to_string(), n);
                }
            }
        }

        Ok(AnalystRecommendations {
            recommendation_counts: counts,
            target_mean_price: rounded(&fin.target_mean_price),
            target_high_price: rounded(&fin.target_high_price),
            target_low_price: rounded(&fin.target_low_price),
            number_of_analysts: raw(&fin.number_of_analyst_opinions).and_then(to_count),
        })
    }
}

fn apply_summary(quote: &mut QuoteSnapshot, summary: &SummaryData) {
    if let Some(price) = &summary.price {
        if let Some(name) = &price.long_name {
            quote.company_name = name.clone();
        }
    }

    if let Some(detail) = &summary.summary_detail {
        quote.day_high = rounded(&detail.day_high).or(quote.day_high);
        quote.day_low = rounded(&detail.day_low).or(quote.day_low);
        quote.volume = raw(&detail.volume).and_then(to_u64).or(quote.volume);
        quote.avg_volume = raw(&detail.average_volume).and_then(to_u64);
        quote.market_cap = raw(&detail.market_cap).and_then(to_u64);
        quote.pe_ratio = rounded(&detail.trailing_pe);
        quote.dividend_yield = percent(&detail.dividend_yield);
        quote.beta = rounded(&detail.beta);
        quote.week_52_high = rounded(&detail.fifty_two_week_high).or(quote.week_52_high);
        quote.week_52_low = rounded(&detail.fifty_two_week_low).or(quote.week_52_low);
        if quote.previous_close.is_none() {
            quote.set_previous_close(raw(&detail.previous_close));
        }
    }

    if let Some(stats) = &summary.default_key_statistics {
        quote.eps = rounded(&stats.trailing_eps);
    }
}

fn at<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

fn rounded(value: &Option<RawValue>) -> Option<f64> {
    raw(value).map(round2)
}

/// Fractions reported by Yahoo (0.0125) become percent (1.25).
fn percent(value: &Option<RawValue>) -> Option<f64> {
    raw(value).map(|v| round2(v * 100.0))
}

fn to_u64(value: f64) -> Option<u64> {
    (value >= 0.0).then(|| value.round() as u64)
}

fn to_count(value: f64) -> Option<u32> {
    (value >= 0.0).then(|| value.round() as u32)
}

#[derive(Debug, serde::Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, serde::Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, serde::Deserialize)]
struct ChartData {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Option<Indicators>,
}

impl ChartData {
    fn quote(&self) -> Option<&QuoteSeries> {
        self.indicators.as_ref().and_then(|i| i.quote.first())
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    gmtoffset: Option<i64>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    regular_market_volume: Option<u64>,
    #[serde(default)]
    fifty_two_week_high: Option<f64>,
    #[serde(default)]
    fifty_two_week_low: Option<f64>,
    #[serde(default)]
    regular_market_day_high: Option<f64>,
    #[serde(default)]
    regular_market_day_low: Option<f64>,
}

#[derive(Debug, serde::Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryEnvelope,
}

#[derive(Debug, serde::Deserialize)]
struct SummaryEnvelope {
    result: Option<Vec<SummaryData>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryData {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<KeyStatistics>,
    financial_data: Option<FinancialData>,
    recommendation_trend: Option<RecommendationTrend>,
}

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`, or `{}` when absent.
#[derive(Debug, Default, serde::Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    long_name: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryDetail {
    previous_close: Option<RawValue>,
    day_high: Option<RawValue>,
    day_low: Option<RawValue>,
    volume: Option<RawValue>,
    average_volume: Option<RawValue>,
    market_cap: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    dividend_yield: Option<RawValue>,
    beta: Option<RawValue>,
    fifty_two_week_high: Option<RawValue>,
    fifty_two_week_low: Option<RawValue>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatistics {
    trailing_eps: Option<RawValue>,
    book_value: Option<RawValue>,
    price_to_book: Option<RawValue>,
    enterprise_value: Option<RawValue>,
    enterprise_to_revenue: Option<RawValue>,
    enterprise_to_ebitda: Option<RawValue>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FinancialData {
    revenue_growth: Option<RawValue>,
    profit_margins: Option<RawValue>,
    operating_margins: Option<RawValue>,
    return_on_equity: Option<RawValue>,
    debt_to_equity: Option<RawValue>,
    current_ratio: Option<RawValue>,
    target_mean_price: Option<RawValue>,
    target_high_price: Option<RawValue>,
    target_low_price: Option<RawValue>,
    number_of_analyst_opinions: Option<RawValue>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RecommendationTrend {
    trend: Vec<TrendPeriod>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TrendPeriod {
    period: Option<String>,
    strong_buy: Option<u32>,
    buy: Option<u32>,
    hold: Option<u32>,
    sell: Option<u32>,
    strong_sell: Option<u32>,
}

use chrono::Local;
use serde::{Deserialize, Serialize};

pub const DEFAULT_COMPANY_NAME: &str = "Tata Power Company Limited";
pub const QUOTE_UNAVAILABLE_MESSAGE: &str = "Unable to fetch real-time data. Please try again later.";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Point-in-time price and valuation fields for the tracked equity.
///
/// Provider-sourced fields are `None` when the provider did not report them;
/// they are never defaulted to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub company_name: String,
    pub current_price: f64,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub volume: Option<u64>,
    pub avg_volume: Option<u64>,
    pub market_cap: Option<u64>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    /// Percent, e.g. `1.25` for 1.25%.
    pub dividend_yield: Option<f64>,
    pub week_52_high: Option<f64>,
    pub week_52_low: Option<f64>,
    pub beta: Option<f64>,
    pub last_updated: String,
}

impl QuoteSnapshot {
    /// Snapshot with only the price known. Everything else starts absent.
    pub fn new(symbol: impl Into<String>, company_name: impl Into<String>, current_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            company_name: company_name.into(),
            current_price: round2(current_price),
            previous_close: None,
            change: None,
            change_percent: None,
            day_high: None,
            day_low: None,
            volume: None,
            avg_volume: None,
            market_cap: None,
            pe_ratio: None,
            eps: None,
            dividend_yield: None,
            week_52_high: None,
            week_52_low: None,
            beta: None,
            last_updated: now_timestamp(),
        }
    }

    pub fn with_previous_close(mut self, previous_close: Option<f64>) -> Self {
        self.set_previous_close(previous_close);
        self
    }

    /// Set the previous close and derive change and change percent from it.
    pub fn set_previous_close(&mut self, previous_close: Option<f64>) {
        self.previous_close = previous_close.map(round2);
        match previous_close {
            Some(prev) if prev > 0.0 => {
                let change = self.current_price - prev;
                self.change = Some(round2(change));
                self.change_percent = Some(round2(change / prev * 100.0));
            }
            _ => {
                self.change = None;
                self.change_percent = None;
            }
        }
    }

    /// Markdown block spliced into the model's system instructions.
    pub fn format_for_chat(&self) -> String {
        format!(
            "📊 **{company}** ({symbol})\n\
             \n\
             **Current Price:** ₹{price}\n\
             **Change:** {change}\n\
             \n\
             **Today's Range:** {day_low} - {day_high}\n\
             **52 Week Range:** {low_52} - {high_52}\n\
             \n\
             **Key Metrics:**\n\
             • P/E Ratio: {pe}\n\
             • EPS: {eps}\n\
             • Market Cap: {market_cap}\n\
             • Volume: {volume}\n\
             • Dividend Yield: {dividend}\n\
             • Beta: {beta}\n\
             \n\
             *Last updated: {updated}*",
            company = self.company_name,
            symbol = self.symbol,
            price = self.current_price,
            change = format_change(self.change, self.change_percent),
            day_low = rupees(self.day_low),
            day_high = rupees(self.day_high),
            low_52 = rupees(self.week_52_low),
            high_52 = rupees(self.week_52_high),
            pe = plain(self.pe_ratio),
            eps = rupees(self.eps),
            market_cap = self
                .market_cap
                .map(|v| format!("₹{}", group_thousands(v)))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            volume = self
                .volume
                .map(|v| format!("{} shares", group_thousands(v)))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            dividend = self
                .dividend_yield
                .map(|v| format!("{v}%"))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            beta = plain(self.beta),
            updated = self.last_updated,
        )
    }
}

/// Fixed record returned when no live quote could be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnavailableQuote {
    pub symbol: String,
    pub company_name: String,
    pub current_price: Option<f64>,
    pub error: String,
    pub last_updated: String,
}

impl UnavailableQuote {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            current_price: None,
            error: QUOTE_UNAVAILABLE_MESSAGE.to_string(),
            last_updated: now_timestamp(),
        }
    }
}

/// Price payload of the stock-data endpoint: a live snapshot or the fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceData {
    Live(Box<QuoteSnapshot>),
    Unavailable(UnavailableQuote),
}

impl PriceData {
    pub fn is_live(&self) -> bool {
        matches!(self, PriceData::Live(_))
    }
}

const NOT_AVAILABLE: &str = "N/A";

fn plain(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn rupees(value: Option<f64>) -> String {
    value
        .map(|v| format!("₹{v}"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn signed(value: f64) -> String {
    if value >= 0.0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

fn format_change(change: Option<f64>, change_percent: Option<f64>) -> String {
    match (change, change_percent) {
        (Some(c), Some(p)) => format!("{} ({}%)", signed(c), signed(p)),
        (Some(c), None) => signed(c),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Round to two decimal places, the precision used for every price and ratio.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QuoteSnapshot {
        let mut q = QuoteSnapshot::new("TATAPOWER.NS", DEFAULT_COMPANY_NAME, 412.35)
            .with_previous_close(Some(405.1));
        q.pe_ratio = Some(15.4);
        q.eps = Some(12.87);
        q.market_cap = Some(1_317_000_000_000);
        q.volume = Some(8_532_114);
        q.day_high = Some(415.0);
        q.day_low = Some(404.2);
        q
    }

    #[test]
    fn test_present_pe_is_rendered() {
        let text = sample().format_for_chat();
        assert!(text.contains("P/E Ratio: 15.4\n"), "{text}");
    }

    #[test]
    fn test_absent_pe_is_not_zero() {
        let mut q = sample();
        q.pe_ratio = None;
        let text = q.format_for_chat();
        assert!(text.contains("P/E Ratio: N/A"));
        assert!(!text.contains("P/E Ratio: 0"));
    }

    #[test]
    fn test_change_derived_from_previous_close() {
        let q = sample();
        assert_eq!(q.change, Some(7.25));
        assert_eq!(q.change_percent, Some(1.79));
        assert!(q.format_for_chat().contains("**Change:** +7.25 (+1.79%)"));
    }

    #[test]
    fn test_missing_previous_close_leaves_change_absent() {
        let q = QuoteSnapshot::new("X", "X Ltd", 10.0).with_previous_close(None);
        assert_eq!(q.change, None);
        assert!(q.format_for_chat().contains("**Change:** N/A"));
    }

    #[test]
    fn test_grouped_numbers() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(8_532_114), "8,532,114");
        let text = sample().format_for_chat();
        assert!(text.contains("Volume: 8,532,114 shares"));
        assert!(text.contains("Market Cap: ₹1,317,000,000,000"));
    }

    #[test]
    fn test_unavailable_record() {
        let data = PriceData::Unavailable(UnavailableQuote::new("TATAPOWER.NS"));
        assert!(!data.is_live());
        let json = serde_json::to_value(&data).unwrap();
        assert!(json["current_price"].is_null());
        assert_eq!(json["error"], QUOTE_UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn test_live_serializes_flat() {
        let data = PriceData::Live(Box::new(sample()));
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["symbol"], "TATAPOWER.NS");
        assert_eq!(json["pe_ratio"], 15.4);
        assert!(json["dividend_yield"].is_null());
    }
}

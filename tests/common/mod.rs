//! Shared test helpers: in-process fakes for the market-data gateway and the
//! completion provider.
#![allow(dead_code)]

use async_trait::async_trait;
use bullsai::domain::entities::bar::HistoricalBar;
use bullsai::domain::entities::fundamentals::{AnalystRecommendations, FinancialMetrics};
use bullsai::domain::entities::quote::QuoteSnapshot;
use bullsai::domain::ports::completion::{CompletionError, CompletionProvider, CompletionRequest};
use bullsai::domain::ports::conversation_store::ConversationStore;
use bullsai::domain::ports::market_data::{GatewayError, MarketDataGateway};
use bullsai::domain::values::intent::KeywordTable;
use bullsai::infrastructure::memory::conversation_store::InMemoryConversationStore;
use bullsai::BullsAi;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SYMBOL: &str = "TATAPOWER.NS";

pub fn sample_quote() -> QuoteSnapshot {
    let mut q = QuoteSnapshot::new(SYMBOL, "Tata Power Company Limited", 412.35)
        .with_previous_close(Some(405.1));
    q.pe_ratio = Some(15.4);
    q.volume = Some(8_532_114);
    q
}

pub fn sample_metrics() -> FinancialMetrics {
    FinancialMetrics {
        revenue_growth: Some(12.7),
        debt_to_equity: Some(153.46),
        ..Default::default()
    }
}

pub struct FakeGateway {
    pub quote: Result<QuoteSnapshot, GatewayError>,
    pub metrics: Result<FinancialMetrics, GatewayError>,
    pub recommendations: Result<AnalystRecommendations, GatewayError>,
    pub bars: Result<Vec<HistoricalBar>, GatewayError>,
    pub quote_calls: AtomicUsize,
    pub metrics_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn healthy() -> Self {
        Self {
            quote: Ok(sample_quote()),
            metrics: Ok(sample_metrics()),
            recommendations: Ok(AnalystRecommendations::default()),
            bars: Ok(vec![HistoricalBar {
                date: "2024-05-30".into(),
                open: 401.0,
                high: 406.0,
                low: 398.5,
                close: 403.2,
                volume: Some(7_000_000),
            }]),
            quote_calls: AtomicUsize::new(0),
            metrics_calls: AtomicUsize::new(0),
        }
    }

    pub fn down() -> Self {
        let err = GatewayError::Network("connection refused".into());
        Self {
            quote: Err(err.clone()),
            metrics: Err(err.clone()),
            recommendations: Err(err.clone()),
            bars: Err(err),
            quote_calls: AtomicUsize::new(0),
            metrics_calls: AtomicUsize::new(0),
        }
    }

    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn metrics_calls(&self) -> usize {
        self.metrics_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataGateway for FakeGateway {
    fn name(&self) -> &str {
        "fake"
    }

    fn symbol(&self) -> &str {
        SYMBOL
    }

    async fn quote_snapshot(&self) -> Result<QuoteSnapshot, GatewayError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.quote.clone()
    }

    async fn historical(&self, _period: &str, _interval: &str) -> Result<Vec<HistoricalBar>, GatewayError> {
        self.bars.clone()
    }

    async fn financial_metrics(&self) -> Result<FinancialMetrics, GatewayError> {
        self.metrics_calls.fetch_add(1, Ordering::SeqCst);
        self.metrics.clone()
    }

    async fn analyst_recommendations(&self) -> Result<AnalystRecommendations, GatewayError> {
        self.recommendations.clone()
    }
}

/// Completion fake that answers `"reply {n}: {user message}"` and records
/// every request it receives.
pub struct FakeCompletion {
    configured: bool,
    fail: bool,
    delay: Option<Duration>,
    pub requests: Mutex<Vec<CompletionRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeCompletion {
    pub fn new() -> Self {
        Self {
            configured: true,
            fail: false,
            delay: None,
            requests: Mutex::new(vec![]),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Highest number of `complete` calls that were running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> CompletionRequest {
        self.requests.lock().unwrap().last().cloned().expect("no completion request recorded")
    }
}

#[async_trait]
impl CompletionProvider for FakeCompletion {
    fn name(&self) -> &str {
        "fake"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let n = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail {
            return Err(CompletionError::Status {
                status: 500,
                message: "upstream exploded: secret-trace-id-123".into(),
            });
        }
        let user = request.messages.last().map(|t| t.content.as_str()).unwrap_or_default();
        Ok(format!("reply {n}: {user}"))
    }
}

pub struct Harness {
    pub app: BullsAi,
    pub completion: Arc<FakeCompletion>,
    pub gateway: Arc<FakeGateway>,
    pub store: Arc<InMemoryConversationStore>,
}

pub fn setup_with(completion: FakeCompletion, gateway: FakeGateway) -> Harness {
    let completion = Arc::new(completion);
    let gateway = Arc::new(gateway);
    let store = Arc::new(InMemoryConversationStore::new());

    let app = BullsAi::with_providers(
        Some(completion.clone() as Arc<dyn CompletionProvider>),
        Some(gateway.clone() as Arc<dyn MarketDataGateway>),
        store.clone() as Arc<dyn ConversationStore>,
        KeywordTable::default(),
    );

    Harness {
        app,
        completion,
        gateway,
        store,
    }
}

pub fn setup() -> Harness {
    setup_with(FakeCompletion::new(), FakeGateway::healthy())
}

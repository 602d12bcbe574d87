pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod server;

use crate::application::chat::{ChatReply, ChatUseCase};
use crate::application::context::ContextAssembler;
use crate::application::stock_data::{StockDataUseCase, StockOverview};
use crate::config::Settings;
use crate::domain::entities::bar::HistoricalBar;
use crate::domain::entities::quote::PriceData;
use crate::domain::entities::turn::Turn;
use crate::domain::error::DomainError;
use crate::domain::ports::completion::CompletionProvider;
use crate::domain::ports::conversation_store::ConversationStore;
use crate::domain::ports::market_data::MarketDataGateway;
use crate::domain::values::intent::{IntentClassifier, IntentFlags, KeywordTable};
use crate::infrastructure::completions::openai::OpenAiProvider;
use crate::infrastructure::feeds::yahoo::YahooGateway;
use crate::infrastructure::memory::conversation_store::InMemoryConversationStore;
use std::sync::Arc;

pub const AI_SERVICE_UNAVAILABLE_MESSAGE: &str =
    "AI service is not available. Please check the server configuration.";

pub struct BullsAi {
    chat_uc: Option<ChatUseCase>,
    stock_uc: Option<StockDataUseCase>,
}

impl BullsAi {
    /// Wire the Yahoo and OpenAI adapters from settings.
    ///
    /// A service whose HTTP client cannot be built is reported unavailable
    /// instead of failing startup. Only a bad keywords file is fatal.
    pub fn new(settings: &Settings) -> Result<Self, DomainError> {
        let keywords = settings.load_keywords()?;

        let completion: Option<Arc<dyn CompletionProvider>> = match OpenAiProvider::new(
            settings.openai_api_key.clone(),
            settings.openai_model.clone(),
            settings.openai_base_url.clone(),
            settings.http_timeout,
        ) {
            Ok(p) => {
                tracing::info!(model = p.model(), configured = p.is_configured(), "AI service ready");
                Some(Arc::new(p))
            }
            Err(e) => {
                tracing::error!(error = %e, "AI service unavailable");
                None
            }
        };

        let gateway: Option<Arc<dyn MarketDataGateway>> = match YahooGateway::new(
            settings.symbol.clone(),
            settings.yahoo_endpoints(),
            settings.http_timeout,
        ) {
            Ok(g) => Some(Arc::new(g)),
            Err(e) => {
                tracing::error!(error = %e, "stock service unavailable");
                None
            }
        };

        Ok(Self::with_providers(
            completion,
            gateway,
            Arc::new(InMemoryConversationStore::new()),
            keywords,
        ))
    }

    pub fn with_providers(
        completion: Option<Arc<dyn CompletionProvider>>,
        gateway: Option<Arc<dyn MarketDataGateway>>,
        store: Arc<dyn ConversationStore>,
        keywords: KeywordTable,
    ) -> Self {
        let chat_uc = completion.map(|completion| {
            ChatUseCase::new(
                IntentClassifier::new(keywords),
                ContextAssembler::new(gateway.clone()),
                completion,
                store,
            )
        });

        Self {
            chat_uc,
            stock_uc: gateway.map(StockDataUseCase::new),
        }
    }

    pub fn ai_service_available(&self) -> bool {
        self.chat_uc.is_some()
    }

    pub fn stock_service_available(&self) -> bool {
        self.stock_uc.is_some()
    }

    pub async fn chat(&self, message: &str, session_id: &str) -> ChatReply {
        match &self.chat_uc {
            Some(uc) => uc.handle(message, session_id).await,
            None => ChatReply {
                response: AI_SERVICE_UNAVAILABLE_MESSAGE.to_string(),
                intent: None,
            },
        }
    }

    /// Intent flags for `query`, with the default tables when the AI service
    /// is down.
    pub fn classify(&self, query: &str) -> IntentFlags {
        match &self.chat_uc {
            Some(uc) => uc.classify(query),
            None => IntentClassifier::default().classify(query),
        }
    }

    pub fn history(&self, session_id: &str) -> Result<Vec<Turn>, DomainError> {
        match &self.chat_uc {
            Some(uc) => uc.history(session_id),
            None => Ok(vec![]),
        }
    }

    /// Forget a session, after any in-flight request on it completes.
    pub async fn evict_session(&self, session_id: &str) -> Result<bool, DomainError> {
        match &self.chat_uc {
            Some(uc) => uc.evict(session_id).await,
            None => Ok(false),
        }
    }

    pub async fn price_data(&self) -> Option<PriceData> {
        match &self.stock_uc {
            Some(uc) => Some(uc.price_data().await),
            None => None,
        }
    }

    pub async fn stock_overview(&self) -> Option<StockOverview> {
        match &self.stock_uc {
            Some(uc) => Some(uc.overview().await),
            None => None,
        }
    }

    pub async fn historical(&self, period: &str, interval: &str) -> Option<Vec<HistoricalBar>> {
        match &self.stock_uc {
            Some(uc) => Some(uc.historical(period, interval).await),
            None => None,
        }
    }
}

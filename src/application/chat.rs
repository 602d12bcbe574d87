use crate::application::context::ContextAssembler;
use crate::domain::entities::turn::Turn;
use crate::domain::error::DomainError;
use crate::domain::ports::completion::{CompletionProvider, CompletionRequest};
use crate::domain::ports::conversation_store::ConversationStore;
use crate::domain::values::intent::{IntentClassifier, IntentFlags};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SYSTEM_PROMPT: &str = "You are BullsAI, an expert AI financial analyst specializing in Indian stock markets, particularly Tata Power.
You have deep knowledge of:
- Financial statement analysis
- Technical and fundamental analysis
- Indian market regulations and dynamics
- Corporate governance and management assessment
- Industry trends and macroeconomic factors

Provide detailed, actionable insights while explaining complex concepts in simple terms.
Always cite specific numbers and ratios when discussing financials.
Be balanced in your analysis, highlighting both opportunities and risks.";

pub const NOT_CONFIGURED_MESSAGE: &str = "I'm not configured with an OpenAI API key yet. To enable AI analysis:\n\
1. Get your API key from https://platform.openai.com/api-keys\n\
2. Add it to the backend .env file as OPENAI_API_KEY=your-key-here\n\
3. Restart the backend server";

pub const APOLOGY_MESSAGE: &str =
    "I apologize, but I encountered an error. Please check the server logs for details.";

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub intent: Option<IntentFlags>,
}

/// Answers one chat message: classify, gather market context, ask the model,
/// remember the exchange.
///
/// Requests for the same session are serialized from history read to history
/// write, so concurrent messages never drop each other's turns.
pub struct ChatUseCase {
    classifier: IntentClassifier,
    context: ContextAssembler,
    completion: Arc<dyn CompletionProvider>,
    store: Arc<dyn ConversationStore>,
    session_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChatUseCase {
    pub fn new(
        classifier: IntentClassifier,
        context: ContextAssembler,
        completion: Arc<dyn CompletionProvider>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            classifier,
            context,
            completion,
            store,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn classify(&self, message: &str) -> IntentFlags {
        self.classifier.classify(message)
    }

    #[tracing::instrument(name = "chat", skip(self, message), fields(request_id = %uuid::Uuid::new_v4()))]
    pub async fn handle(&self, message: &str, session_id: &str) -> ChatReply {
        let intent = self.classifier.classify(message);

        if !self.completion.is_configured() {
            tracing::warn!(provider = self.completion.name(), "completion provider not configured");
            return ChatReply {
                response: NOT_CONFIGURED_MESSAGE.to_string(),
                intent: Some(intent),
            };
        }

        let result = self.respond(message, session_id, &intent).await;
        if let Err(e) = self.prune_lock(session_id) {
            tracing::warn!(error = %e, "could not prune session lock");
        }

        match result {
            Ok(response) => ChatReply {
                response,
                intent: Some(intent),
            },
            Err(e) => {
                tracing::error!(error = %e, "chat request failed");
                ChatReply {
                    response: APOLOGY_MESSAGE.to_string(),
                    intent: Some(intent),
                }
            }
        }
    }

    async fn respond(&self, message: &str, session_id: &str, intent: &IntentFlags) -> Result<String, DomainError> {
        let lock = self.session_lock(session_id)?;
        let _guard = lock.lock().await;

        let context = self.context.build_context(message, intent).await;
        let history = self.store.get(session_id)?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Turn::system(format!("{SYSTEM_PROMPT}{context}")));
        messages.extend(history);
        messages.push(Turn::user(message));

        let reply = self
            .completion
            .complete(&CompletionRequest {
                messages,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            })
            .await?;

        self.store
            .append(session_id, vec![Turn::user(message), Turn::assistant(reply.clone())])?;
        tracing::debug!(reply_len = reply.len(), "stored exchange");

        Ok(reply)
    }

    pub fn history(&self, session_id: &str) -> Result<Vec<Turn>, DomainError> {
        self.store.get(session_id)
    }

    /// Forget a session's history. Returns whether it existed.
    ///
    /// Waits for any in-flight request on the session to finish first, so
    /// the eviction is ordered with the session's other requests.
    pub async fn evict(&self, session_id: &str) -> Result<bool, DomainError> {
        let lock = self.session_lock(session_id)?;
        let evicted = {
            let _guard = lock.lock().await;
            self.store.evict(session_id)?
        };
        drop(lock);
        self.prune_lock(session_id)?;
        tracing::debug!(evicted, remaining = self.store.session_count()?, "session evicted");
        Ok(evicted)
    }

    fn session_lock(&self, session_id: &str) -> Result<Arc<tokio::sync::Mutex<()>>, DomainError> {
        let mut locks = self
            .session_locks
            .lock()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(locks.entry(session_id.to_string()).or_default().clone())
    }

    /// Drop the session's lock once no request holds or awaits it.
    fn prune_lock(&self, session_id: &str) -> Result<(), DomainError> {
        let mut locks = self
            .session_locks
            .lock()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        if locks.get(session_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(session_id);
        }
        Ok(())
    }
}

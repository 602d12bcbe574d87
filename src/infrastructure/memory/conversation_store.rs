use crate::domain::entities::turn::Turn;
use crate::domain::error::DomainError;
use crate::domain::ports::conversation_store::{ConversationStore, MAX_HISTORY_TURNS};
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-lifetime conversation history held in memory.
pub struct InMemoryConversationStore {
    sessions: Mutex<HashMap<String, Vec<Turn>>>,
    max_turns: usize,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_TURNS)
    }

    /// Keep at most `max_turns` entries per session.
    pub fn with_capacity(max_turns: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_turns,
        }
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn get(&self, session_id: &str) -> Result<Vec<Turn>, DomainError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    fn append(&self, session_id: &str, turns: Vec<Turn>) -> Result<(), DomainError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let history = sessions.entry(session_id.to_string()).or_default();
        history.extend(turns);
        if history.len() > self.max_turns {
            let excess = history.len() - self.max_turns;
            history.drain(..excess);
        }
        Ok(())
    }

    fn evict(&self, session_id: &str) -> Result<bool, DomainError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(sessions.remove(session_id).is_some())
    }

    fn session_count(&self) -> Result<usize, DomainError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(store: &InMemoryConversationStore, session: &str, n: usize) {
        store
            .append(
                session,
                vec![Turn::user(format!("q{n}")), Turn::assistant(format!("a{n}"))],
            )
            .unwrap();
    }

    #[test]
    fn test_unknown_session_is_empty() {
        let store = InMemoryConversationStore::new();
        assert!(store.get("nope").unwrap().is_empty());
        assert_eq!(store.session_count().unwrap(), 0);
    }

    #[test]
    fn test_window_keeps_most_recent_in_order() {
        let store = InMemoryConversationStore::new();
        for n in 1..=15 {
            exchange(&store, "s", n);
            assert!(store.get("s").unwrap().len() <= MAX_HISTORY_TURNS);
        }

        let history = store.get("s").unwrap();
        assert_eq!(history.len(), MAX_HISTORY_TURNS);
        assert_eq!(history[0], Turn::user("q6"));
        assert_eq!(history[19], Turn::assistant("a15"));
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = InMemoryConversationStore::new();
        exchange(&store, "a", 1);
        exchange(&store, "b", 1);
        exchange(&store, "b", 2);

        assert_eq!(store.get("a").unwrap().len(), 2);
        assert_eq!(store.get("b").unwrap().len(), 4);
        assert_eq!(store.session_count().unwrap(), 2);
    }

    #[test]
    fn test_evict() {
        let store = InMemoryConversationStore::new();
        exchange(&store, "a", 1);
        assert!(store.evict("a").unwrap());
        assert!(!store.evict("a").unwrap());
        assert!(store.get("a").unwrap().is_empty());
    }

    #[test]
    fn test_custom_capacity() {
        let store = InMemoryConversationStore::with_capacity(4);
        for n in 1..=3 {
            exchange(&store, "s", n);
        }
        let history = store.get("s").unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0], Turn::user("q2"));
    }
}

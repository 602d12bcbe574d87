use crate::domain::entities::turn::Turn;
use crate::domain::error::DomainError;

/// Most turns kept per session (10 user/assistant exchanges).
pub const MAX_HISTORY_TURNS: usize = 20;

/// Bounded per-session conversation history.
///
/// Implementations keep at most [`MAX_HISTORY_TURNS`] entries per session,
/// dropping the oldest first. Unknown sessions read as empty.
pub trait ConversationStore: Send + Sync {
    fn get(&self, session_id: &str) -> Result<Vec<Turn>, DomainError>;

    /// Append `turns` in order, then trim the session to its newest entries.
    fn append(&self, session_id: &str, turns: Vec<Turn>) -> Result<(), DomainError>;

    /// Drop a session. Returns whether it existed.
    fn evict(&self, session_id: &str) -> Result<bool, DomainError>;

    fn session_count(&self) -> Result<usize, DomainError>;
}

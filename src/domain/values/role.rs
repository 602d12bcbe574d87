use serde::{Deserialize, Serialize};

/// Author of a conversation turn. Serialized in the lowercase form chat
/// completion APIs expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

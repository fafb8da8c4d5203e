use serde::{Deserialize, Serialize};

/// One completed user/assistant exchange. Immutable once recorded;
/// chronological order across turns is conversationally significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user: String,
    pub assistant: String,
}

impl ConversationTurn {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Ordered turn sequence, owned by the caller for the lifetime of a
/// session. The core only ever borrows it.
pub type ConversationHistory = Vec<ConversationTurn>;

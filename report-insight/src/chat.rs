use std::sync::RwLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in the conversation over the current report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Append-only conversation history, scoped to the current document. Turns
/// are never edited or removed; the whole transcript is dropped when the
/// document is replaced.
#[derive(Debug, Default)]
pub struct ChatTranscript {
    turns: RwLock<Vec<ChatTurn>>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&self, content: impl Into<String>) {
        self.push(ChatRole::User, content);
    }

    pub fn push_assistant(&self, content: impl Into<String>) {
        self.push(ChatRole::Assistant, content);
    }

    fn push(&self, role: ChatRole, content: impl Into<String>) {
        self.turns.write().unwrap().push(ChatTurn {
            role,
            content: content.into(),
        });
    }

    pub fn snapshot(&self) -> Vec<ChatTurn> {
        self.turns.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.turns.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.read().unwrap().is_empty()
    }
}

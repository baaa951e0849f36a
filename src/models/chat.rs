use serde::{ Serialize, Deserialize };
use std::fmt;

/// Platform identifier of a chat participant.
pub type UserId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// The bounded dialogue log of one user.
///
/// `messages[0]` is always the system turn the record was seeded with. Callers
/// only ever see snapshots; the owning store is the only writer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConversationRecord {
    user_id: UserId,
    messages: Vec<Turn>,
}

impl ConversationRecord {
    pub fn new(user_id: UserId, system_prompt: &str) -> Self {
        Self {
            user_id,
            messages: vec![Turn::system(system_prompt)],
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn messages(&self) -> &[Turn] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends `turn`, then drops the oldest non-system turns until at most
    /// `max_history` of them remain after the system turn.
    pub(crate) fn push_bounded(&mut self, turn: Turn, max_history: usize) {
        self.messages.push(turn);
        let limit = max_history + 1;
        if self.messages.len() > limit {
            let excess = self.messages.len() - limit;
            self.messages.drain(1..1 + excess);
        }
    }
}

mod memory;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;
use crate::models::chat::{ ConversationRecord, Role, UserId };

pub use memory::InMemoryConversationStore;

pub const DEFAULT_MAX_HISTORY: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("role '{0}' cannot be appended; system turns are only created when a record is seeded")]
    InvalidRole(Role),
}

/// Per-user bounded dialogue memory.
///
/// `get` creates the record on first access: a brand-new user always gets a
/// record holding exactly one system turn. `append` implies `get`. `clear`
/// forgets the user entirely and is a no-op for unknown users.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get(&self, user_id: UserId) -> ConversationRecord;

    async fn append(&self, user_id: UserId, role: Role, content: &str) -> Result<(), HistoryError>;

    async fn clear(&self, user_id: UserId);
}

pub fn create_conversation_store(args: &Args, system_prompt: &str) -> Arc<dyn ConversationStore> {
    info!("Conversation memory: in-process, {} turns per user", args.max_history);
    Arc::new(InMemoryConversationStore::new(args.max_history, system_prompt))
}

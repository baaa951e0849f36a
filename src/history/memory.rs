use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ ConversationStore, HistoryError, DEFAULT_MAX_HISTORY };
use crate::models::chat::{ ConversationRecord, Role, Turn, UserId };

/// Process-lifetime store. Starts empty, nothing survives a restart.
pub struct InMemoryConversationStore {
    records: RwLock<HashMap<UserId, ConversationRecord>>,
    max_history: usize,
    system_prompt: String,
}

impl InMemoryConversationStore {
    pub fn new(max_history: usize, system_prompt: impl Into<String>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            max_history,
            system_prompt: system_prompt.into(),
        }
    }

    pub async fn user_count(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY, crate::config::prompt::DEFAULT_SYSTEM_PROMPT)
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, user_id: UserId) -> ConversationRecord {
        if let Some(record) = self.records.read().await.get(&user_id) {
            return record.clone();
        }

        let mut records = self.records.write().await;
        records
            .entry(user_id)
            .or_insert_with(|| {
                debug!("Seeding conversation for user {}", user_id);
                ConversationRecord::new(user_id, &self.system_prompt)
            })
            .clone()
    }

    async fn append(&self, user_id: UserId, role: Role, content: &str) -> Result<(), HistoryError> {
        if role == Role::System {
            return Err(HistoryError::InvalidRole(role));
        }

        let mut records = self.records.write().await;
        let record = records
            .entry(user_id)
            .or_insert_with(|| ConversationRecord::new(user_id, &self.system_prompt));
        record.push_bounded(Turn::new(role, content), self.max_history);
        Ok(())
    }

    async fn clear(&self, user_id: UserId) {
        if self.records.write().await.remove(&user_id).is_some() {
            debug!("Cleared conversation for user {}", user_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_inserts_seeded_record() {
        let store = InMemoryConversationStore::new(10, "persona");
        assert_eq!(store.user_count().await, 0);

        let record = store.get(7).await;
        assert_eq!(record.user_id(), 7);
        assert_eq!(record.messages(), &[Turn::system("persona")]);
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn append_rejects_system_role() {
        let store = InMemoryConversationStore::new(10, "persona");
        let err = store.append(1, Role::System, "override").await.unwrap_err();
        assert_eq!(err, HistoryError::InvalidRole(Role::System));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn append_accepts_empty_content() {
        let store = InMemoryConversationStore::new(10, "persona");
        store.append(1, Role::User, "").await.unwrap();
        let record = store.get(1).await;
        assert_eq!(record.len(), 2);
        assert_eq!(record.messages()[1], Turn::new(Role::User, ""));
    }

    #[tokio::test]
    async fn snapshot_is_detached_from_store() {
        let store = InMemoryConversationStore::new(10, "persona");
        let before = store.get(1).await;
        store.append(1, Role::User, "later").await.unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(store.get(1).await.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_appends_for_different_users_stay_bounded() {
        let store = std::sync::Arc::new(InMemoryConversationStore::new(4, "persona"));
        let mut handles = Vec::new();
        for user in 0..8i64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..20 {
                    store.append(user, Role::User, &format!("{}-{}", user, i)).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        for user in 0..8i64 {
            let record = store.get(user).await;
            assert_eq!(record.len(), 5);
            assert_eq!(record.messages()[4].content, format!("{}-19", user));
        }
    }
}

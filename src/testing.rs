//! In-process fakes for the gateway and completion seams.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{ AtomicU32, Ordering };
use std::sync::Mutex;
use std::time::Duration;

use crate::gateway::{ BotIdentity, ChatGateway, ChatId, GatewayError, InboundEvent, MessageKind, TextFormat };
use crate::llm::chat::{ ChatClient, CompletionResponse };
use crate::llm::LlmError;
use crate::models::chat::{ Role, Turn, UserId };

pub fn text_event(user_id: UserId, text: &str) -> InboundEvent {
    InboundEvent {
        chat_id: user_id * 10,
        user_id,
        first_name: Some("Ada".to_string()),
        kind: MessageKind::Text(text.to_string()),
    }
}

/// Replies `re:<last user turn>` unless a scripted result is queued.
#[derive(Default)]
pub struct ScriptedClient {
    scripted: Mutex<VecDeque<Result<String, LlmError>>>,
    pub seen: Mutex<Vec<Vec<Turn>>>,
    delay: Option<Duration>,
}

impl ScriptedClient {
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::default() }
    }

    pub fn push(&self, result: Result<String, LlmError>) {
        self.scripted.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn complete(&self, messages: &[Turn]) -> Result<CompletionResponse, LlmError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.scripted.lock().unwrap().pop_front();
        let response = match scripted {
            Some(result) => result?,
            None => {
                let last_user = messages
                    .iter()
                    .rev()
                    .find(|t| t.role == Role::User)
                    .map(|t| t.content.as_str())
                    .unwrap_or("");
                format!("re:{}", last_user)
            }
        };
        Ok(CompletionResponse { response })
    }

    fn get_model(&self) -> String {
        "scripted".to_string()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

#[derive(Default)]
pub struct RecordingGateway {
    pub sent: Mutex<Vec<(ChatId, String, TextFormat)>>,
    pub typing: Mutex<Vec<ChatId>>,
    batches: Mutex<VecDeque<Result<Vec<InboundEvent>, GatewayError>>>,
    verify_failures: AtomicU32,
    pub verify_calls: AtomicU32,
}

impl RecordingGateway {
    pub fn failing_verify(times: u32) -> Self {
        let gateway = Self::default();
        gateway.verify_failures.store(times, Ordering::SeqCst);
        gateway
    }

    pub fn push_batch(&self, batch: Result<Vec<InboundEvent>, GatewayError>) {
        self.batches.lock().unwrap().push_back(batch);
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, text, _)| text.clone()).collect()
    }
}

#[async_trait]
impl ChatGateway for RecordingGateway {
    async fn verify(&self) -> Result<BotIdentity, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.verify_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.verify_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(GatewayError::Api { description: "network unreachable".to_string() });
        }
        Ok(BotIdentity { id: 1, username: Some("relay_bot".to_string()) })
    }

    async fn poll(&self) -> Result<Vec<InboundEvent>, GatewayError> {
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_text(&self, chat_id: ChatId, text: &str, format: TextFormat) -> Result<(), GatewayError> {
        self.sent.lock().unwrap().push((chat_id, text.to_string(), format));
        Ok(())
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<(), GatewayError> {
        self.typing.lock().unwrap().push(chat_id);
        Ok(())
    }
}

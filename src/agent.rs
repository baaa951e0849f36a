use log::{ debug, error, info, warn };
use std::sync::Arc;
use std::time::Duration;

use crate::commands::{ self, Command, Incoming };
use crate::config::prompt::PromptConfig;
use crate::error::RelayError;
use crate::gateway::{ ChatGateway, InboundEvent, MessageKind, TextFormat };
use crate::history::ConversationStore;
use crate::llm::chat::ChatClient;
use crate::llm::LlmError;
use crate::models::chat::{ Role, UserId };

/// Turns inbound events into replies.
///
/// Events for one user must not be handled concurrently; the dispatcher feeds
/// each user's events through a single worker.
pub struct RelayAgent {
    store: Arc<dyn ConversationStore>,
    chat_client: Arc<dyn ChatClient>,
    gateway: Arc<dyn ChatGateway>,
    prompts: Arc<PromptConfig>,
    completion_timeout: Duration,
    bot_username: Option<String>,
}

impl RelayAgent {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        chat_client: Arc<dyn ChatClient>,
        gateway: Arc<dyn ChatGateway>,
        prompts: Arc<PromptConfig>,
        completion_timeout: Duration
    ) -> Self {
        Self {
            store,
            chat_client,
            gateway,
            prompts,
            completion_timeout,
            bot_username: None,
        }
    }

    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    pub async fn handle_event(&self, event: InboundEvent) {
        let reply = match &event.kind {
            MessageKind::Text(text) =>
                match commands::parse(text, self.bot_username.as_deref()) {
                    Incoming::Command(command) => Some(self.run_command(command, &event).await),
                    Incoming::Ignored => {
                        debug!("Ignoring unknown command from user {}", event.user_id);
                        None
                    }
                    Incoming::Chat(text) => Some(self.chat_reply(&event, text).await),
                }
            MessageKind::Sticker => Some((self.prompts.sticker.clone(), TextFormat::Plain)),
            MessageKind::Photo => Some((self.prompts.photo.clone(), TextFormat::Plain)),
            MessageKind::Voice => Some((self.prompts.voice.clone(), TextFormat::Plain)),
            MessageKind::Unsupported => None,
        };

        if let Some((text, format)) = reply {
            if let Err(e) = self.gateway.send_text(event.chat_id, &text, format).await {
                error!("Failed to send reply to chat {}: {}", event.chat_id, e);
            }
        }
    }

    async fn run_command(&self, command: Command, event: &InboundEvent) -> (String, TextFormat) {
        match command {
            Command::Start =>
                (self.prompts.render_start(event.first_name.as_deref()), TextFormat::Plain),
            Command::Help => (self.prompts.help.clone(), TextFormat::Markdown),
            Command::About => (self.prompts.about.clone(), TextFormat::Markdown),
            Command::Clear => {
                self.store.clear(event.user_id).await;
                info!("Conversation cleared for user {}", event.user_id);
                (self.prompts.cleared.clone(), TextFormat::Plain)
            }
        }
    }

    async fn chat_reply(&self, event: &InboundEvent, text: &str) -> (String, TextFormat) {
        if let Err(e) = self.gateway.send_typing(event.chat_id).await {
            warn!("Failed to send typing action to chat {}: {}", event.chat_id, e);
        }

        match self.process_message(event.user_id, text).await {
            Ok(reply) => (reply, TextFormat::Plain),
            Err(RelayError::Llm(e)) => {
                let kind = e.category();
                error!("Completion for user {} failed ({}): {}", event.user_id, kind, e);
                (self.prompts.failure_reply(kind), TextFormat::Plain)
            }
            Err(e) => {
                error!("Unexpected error handling message from user {}: {}", event.user_id, e);
                (self.prompts.unexpected_error.clone(), TextFormat::Plain)
            }
        }
    }

    /// One dialogue turn: record the user's text, ask the model with the whole
    /// record as context, record the reply.
    ///
    /// On failure the user turn stays recorded and nothing else is added.
    pub async fn process_message(&self, user_id: UserId, text: &str) -> Result<String, RelayError> {
        self.store.append(user_id, Role::User, text).await?;
        let conversation = self.store.get(user_id).await;
        debug!("Requesting completion for user {} with {} turns", user_id, conversation.len());

        let completion = tokio::time
            ::timeout(self.completion_timeout, self.chat_client.complete(conversation.messages())).await
            .map_err(|_| LlmError::Timeout)??;

        self.store.append(user_id, Role::Assistant, &completion.response).await?;
        Ok(completion.response)
    }
}

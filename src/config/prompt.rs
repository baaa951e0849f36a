use log::info;
use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use thiserror::Error;

use crate::llm::FailureKind;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful, friendly, and intelligent AI assistant. Be concise but informative. Use emojis occasionally to be friendly.";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file IO error for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Prompt JSON parsing error for '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Prompt '{0}' must not be empty")]
    Empty(&'static str),
}

/// Persona and every canned reply the bot sends.
///
/// A prompts file only needs the keys it overrides; anything missing keeps
/// the built-in text.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    pub system_prompt: String,
    /// `{first_name}` is replaced with the sender's first name.
    pub start: String,
    pub help: String,
    pub about: String,
    pub cleared: String,
    pub sticker: String,
    pub photo: String,
    pub voice: String,
    pub unexpected_error: String,
    pub error_prefix: String,
    pub error_auth: String,
    pub error_rate_limit: String,
    pub error_timeout: String,
    pub error_generic: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            start: concat!(
                "👋 Hello {first_name}!\n\n",
                "I'm an AI assistant powered by Groq. I can:\n\n",
                "💬 Have conversations with you\n",
                "❓ Answer questions\n",
                "📝 Help with writing\n",
                "💡 Explain complex topics\n",
                "🌍 Translate languages\n",
                "💻 Help with coding\n",
                "🎨 Be creative\n\n",
                "Just send me any message and I'll respond!\n\n",
                "Commands:\n",
                "/start - Show this message\n",
                "/help - Get help\n",
                "/clear - Clear conversation history\n",
                "/about - About this bot"
            ).to_string(),
            help: concat!(
                "📖 *How to use:*\n\n",
                "Just send me any message and I'll respond intelligently!\n\n",
                "*Examples:*\n",
                "• \"What's the weather like in Paris?\"\n",
                "• \"Explain quantum physics simply\"\n",
                "• \"Write a poem about cats\"\n",
                "• \"Help me debug this code: ...\"\n",
                "• \"Translate 'Hello' to Spanish\"\n\n",
                "*Commands:*\n",
                "/clear - Clear our conversation history\n",
                "/about - Learn about this bot"
            ).to_string(),
            about: concat!(
                "🤖 *AI Chat Bot*\n\n",
                "This bot uses:\n",
                "• Groq AI (ultra-fast inference)\n",
                "• Llama 3.3 70B model\n",
                "• Conversation memory\n\n",
                "I remember our conversation to give contextual responses!"
            ).to_string(),
            cleared: "🧹 Conversation history cleared! Starting fresh.".to_string(),
            sticker: "😊 Nice sticker! But I can only respond to text messages.".to_string(),
            photo: "📷 I see you sent a photo, but I can only process text for now!".to_string(),
            voice: "🎤 I received your voice message, but I can only respond to text!".to_string(),
            unexpected_error: "❌ An unexpected error occurred. Please try again.".to_string(),
            error_prefix: "❌ Sorry, I encountered an error.\n\n".to_string(),
            error_auth: "The API key is invalid or missing.".to_string(),
            error_rate_limit: "Too many requests. Please wait a moment.".to_string(),
            error_timeout: "Request timed out. Please try again.".to_string(),
            error_generic: "Please try again in a moment.".to_string(),
        }
    }
}

impl PromptConfig {
    pub fn render_start(&self, first_name: Option<&str>) -> String {
        let name = first_name.filter(|n| !n.trim().is_empty()).unwrap_or("there");
        self.start.replace("{first_name}", name)
    }

    pub fn failure_reply(&self, kind: FailureKind) -> String {
        let detail = match kind {
            FailureKind::Auth => &self.error_auth,
            FailureKind::RateLimit => &self.error_rate_limit,
            FailureKind::Timeout => &self.error_timeout,
            FailureKind::Generic => &self.error_generic,
        };
        format!("{}{}", self.error_prefix, detail)
    }

    fn validate(&self) -> Result<(), PromptError> {
        if self.system_prompt.trim().is_empty() {
            return Err(PromptError::Empty("system_prompt"));
        }
        Ok(())
    }
}

pub fn load_prompts_from_str(json: &str, path: &str) -> Result<PromptConfig, PromptError> {
    serde_json::from_str(json).map_err(|source| PromptError::Json {
        path: path.to_string(),
        source,
    })
}

/// Built-in prompts, overlaid with `path` when given and then with an
/// explicit `system_prompt` override.
pub fn load_prompts(
    path: Option<&str>,
    system_prompt: Option<&str>
) -> Result<Arc<PromptConfig>, PromptError> {
    let mut config = match path {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|source| PromptError::Io {
                path: path.to_string(),
                source,
            })?;
            let config = load_prompts_from_str(&json, path)?;
            info!("Loaded prompts from {}", path);
            config
        }
        None => PromptConfig::default(),
    };

    if let Some(prompt) = system_prompt {
        config.system_prompt = prompt.to_string();
    }
    config.validate()?;
    Ok(Arc::new(config))
}

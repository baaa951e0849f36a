use clap::Parser;

use crate::history::DEFAULT_MAX_HISTORY;
use crate::llm::{ LlmConfig, LlmType, SamplingParams };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Telegram Args ---
    /// Bot token issued by @BotFather.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", default_value = "", hide_env_values = true)]
    pub telegram_bot_token: String,

    /// Base URL of the Telegram Bot API.
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,

    /// Long-poll timeout in seconds for getUpdates.
    #[arg(long, env = "TELEGRAM_POLL_TIMEOUT", default_value = "30")]
    pub telegram_poll_timeout: u32,

    /// Maximum outbound Telegram calls per second.
    #[arg(long, env = "TELEGRAM_SEND_RATE", default_value = "25")]
    pub telegram_send_rate: u32,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (groq, openai, ollama)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "groq")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider. Falls back to GROQ_API_KEY.
    #[arg(long, env = "CHAT_API_KEY", hide_env_values = true)]
    pub chat_api_key: Option<String>,

    #[arg(long, env = "GROQ_API_KEY", hide = true, hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Model name for chat completion (e.g., llama-3.3-70b-versatile, gpt-4o-mini, llama3.1)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub chat_temperature: f32,

    #[arg(long, env = "CHAT_MAX_TOKENS", default_value = "1024")]
    pub chat_max_tokens: u32,

    #[arg(long, env = "CHAT_TOP_P", default_value = "1.0")]
    pub chat_top_p: f32,

    /// Seconds to wait for a completion before giving up on the turn.
    #[arg(long, env = "CHAT_TIMEOUT_SECS", default_value = "60")]
    pub chat_timeout_secs: u64,

    // --- Conversation Memory Args ---
    /// Conversational turns remembered per user, not counting the system prompt.
    #[arg(long, env = "MAX_HISTORY", default_value_t = DEFAULT_MAX_HISTORY)]
    pub max_history: usize,

    /// Persona text seeded as the first turn of every conversation.
    #[arg(long, env = "SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    /// Optional JSON file overriding the persona and canned replies.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    // --- Launch Args ---
    /// Startup attempts before giving up.
    #[arg(long, env = "LAUNCH_RETRIES", default_value = "3")]
    pub launch_retries: u32,

    #[arg(long, env = "LAUNCH_RETRY_DELAY_SECS", default_value = "3")]
    pub launch_retry_delay_secs: u64,
}

impl Args {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.chat_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.groq_api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    pub fn llm_config(&self) -> Result<LlmConfig, String> {
        let llm_type: LlmType = self.chat_llm_type
            .parse()
            .map_err(|e| format!("Invalid chat LLM type: {}", e))?;
        let api_key = self.resolved_api_key();
        if llm_type.requires_api_key() && api_key.is_none() {
            return Err(format!("CHAT_API_KEY (or GROQ_API_KEY) is required for {}", llm_type));
        }

        Ok(LlmConfig {
            llm_type,
            api_key,
            completion_model: self.chat_model.clone().filter(|m| !m.trim().is_empty()),
            base_url: self.chat_base_url.clone().filter(|u| !u.trim().is_empty()),
            sampling: SamplingParams {
                temperature: self.chat_temperature,
                max_tokens: self.chat_max_tokens,
                top_p: self.chat_top_p,
            },
        })
    }
}

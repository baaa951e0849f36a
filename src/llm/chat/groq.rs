use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::openai::{ chat_completion, OpenAIChatRequest };
use super::{ build_http_client, ChatClient, CompletionResponse };
use crate::llm::{ LlmConfig, LlmError, SamplingParams };
use crate::models::chat::Turn;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Groq speaks the OpenAI chat-completions protocol under `/openai/v1`.
pub struct GroqChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    sampling: SamplingParams,
}

impl GroqChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        sampling: SamplingParams
    ) -> Result<Self, LlmError> {
        Ok(Self {
            http: build_http_client(Some(&api_key))?,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            sampling,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| LlmError::Config("Groq API key is required".to_string()))?;

        Self::new(api_key, config.completion_model.clone(), config.base_url.clone(), config.sampling)
    }
}

#[async_trait]
impl ChatClient for GroqChatClient {
    async fn complete(&self, messages: &[Turn]) -> Result<CompletionResponse, LlmError> {
        let req = OpenAIChatRequest::new(&self.model, messages, &self.sampling);
        chat_completion(&self.http, &self.base_url, &req).await
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}

pub mod groq;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE } };
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use self::groq::GroqChatClient;
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;
use super::{ LlmConfig, LlmError, LlmType };
use crate::models::chat::Turn;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub response: String,
}

/// A non-streaming completion endpoint. `messages` is sent as-is, in order,
/// as the prompt context.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, messages: &[Turn]) -> Result<CompletionResponse, LlmError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Ollama => {
            let specific_client = OllamaClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Groq => {
            let specific_client = GroqChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}

pub(crate) fn build_http_client(api_key: Option<&str>) -> Result<HttpClient, LlmError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(key) = api_key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| LlmError::Config(format!("Invalid API key format: {}", e)))?
        );
    }

    HttpClient::builder()
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Non-empty reply text or `EmptyResponse`.
pub(crate) fn non_empty(content: Option<String>) -> Result<CompletionResponse, LlmError> {
    match content {
        Some(text) if !text.trim().is_empty() => Ok(CompletionResponse { response: text }),
        _ => Err(LlmError::EmptyResponse),
    }
}

/// Sends `request` and turns any non-2xx status into a categorized error.
pub(crate) async fn send_checked(
    request: reqwest::RequestBuilder
) -> Result<reqwest::Response, LlmError> {
    let resp = request.send().await?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(LlmError::from_status(status, body))
}

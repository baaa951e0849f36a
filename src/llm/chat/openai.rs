use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };

use super::{ build_http_client, non_empty, send_checked, ChatClient, CompletionResponse };
use crate::llm::{ LlmConfig, LlmError, SamplingParams };
use crate::models::chat::Turn;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct OpenAIMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Serialize, Debug)]
pub(crate) struct OpenAIChatRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

impl OpenAIChatRequest {
    pub fn new(model: &str, messages: &[Turn], sampling: &SamplingParams) -> Self {
        Self {
            model: model.to_string(),
            messages: messages
                .iter()
                .map(|turn| OpenAIMessage {
                    role: turn.role.as_str().to_string(),
                    content: Some(turn.content.clone()),
                })
                .collect(),
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            top_p: sampling.top_p,
            stream: false,
        }
    }
}

/// `POST {base_url}/chat/completions` and pull `choices[0].message.content`.
pub(crate) async fn chat_completion(
    http: &HttpClient,
    base_url: &str,
    req: &OpenAIChatRequest
) -> Result<CompletionResponse, LlmError> {
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    debug!("Chat completion request to {} ({} messages)", url, req.messages.len());

    let resp = send_checked(http.post(&url).json(req)).await?
        .json::<OpenAIResponse>().await?;

    let content = resp.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content);
    non_empty(content)
}

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    sampling: SamplingParams,
}

impl OpenAIChatClient {
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
            .ok_or_else(|| LlmError::Config("OpenAI API key is required".to_string()))?;

        Self::new(api_key, config.completion_model.clone(), config.base_url.clone(), config.sampling)
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
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

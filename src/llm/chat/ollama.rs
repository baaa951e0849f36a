use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };

use super::{ build_http_client, non_empty, send_checked, ChatClient, CompletionResponse };
use crate::llm::{ LlmConfig, LlmError, SamplingParams };
use crate::models::chat::Turn;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.1";

pub struct OllamaClient {
    http: HttpClient,
    model: String,
    base_url: String,
    sampling: SamplingParams,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaReply>,
}

#[derive(Deserialize)]
struct OllamaReply {
    content: Option<String>,
}

impl OllamaClient {
    pub fn new(model: Option<String>, base_url: Option<String>, sampling: SamplingParams) -> Result<Self, LlmError> {
        Ok(Self {
            http: build_http_client(None)?,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            sampling,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(config.completion_model.clone(), config.base_url.clone(), config.sampling)
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn complete(&self, messages: &[Turn]) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let req = OllamaChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|turn| OllamaMessage { role: turn.role.as_str(), content: &turn.content })
                .collect(),
            stream: false,
            options: OllamaOptions {
                temperature: self.sampling.temperature,
                top_p: self.sampling.top_p,
                num_predict: self.sampling.max_tokens,
            },
        };

        let resp = send_checked(self.http.post(&url).json(&req)).await?
            .json::<OllamaChatResponse>().await?;
        non_empty(resp.message.and_then(|m| m.content))
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}

use thiserror::Error;

use crate::config::prompt::PromptError;
use crate::gateway::GatewayError;
use crate::history::HistoryError;
use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// User-facing grouping of completion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Auth,
    RateLimit,
    Timeout,
    Generic,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Auth => "auth",
            FailureKind::RateLimit => "rate_limit",
            FailureKind::Timeout => "timeout",
            FailureKind::Generic => "generic",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key is invalid or missing (HTTP {status}): {body}")]
    Auth { status: u16, body: String },
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("completion request timeout")]
    Timeout,
    #[error("No response from AI")]
    EmptyResponse,
    #[error("completion API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("completion transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("invalid completion client configuration: {0}")]
    Config(String),
}

impl LlmError {
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => LlmError::Auth { status: status.as_u16(), body },
            429 => LlmError::RateLimited(body),
            408 | 504 => LlmError::Timeout,
            code => LlmError::Http { status: code, body },
        }
    }

    pub fn category(&self) -> FailureKind {
        match self {
            LlmError::Auth { .. } => FailureKind::Auth,
            LlmError::RateLimited(_) => FailureKind::RateLimit,
            LlmError::Timeout => FailureKind::Timeout,
            _ => FailureKind::Generic,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return LlmError::Timeout;
        }
        match err.status() {
            Some(status) => LlmError::from_status(status, err.to_string()),
            None => LlmError::Transport(err),
        }
    }
}

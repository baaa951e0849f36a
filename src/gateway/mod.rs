pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::chat::UserId;

pub use telegram::TelegramGateway;

pub type ChatId = i64;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Telegram transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Telegram API error: {description}")]
    Api { description: String },
    #[error("invalid gateway configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Text(String),
    Sticker,
    Photo,
    Voice,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub first_name: Option<String>,
    pub kind: MessageKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: i64,
    pub username: Option<String>,
}

/// The chat platform as seen by the relay.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Startup check; fails when the platform is unreachable or the token is bad.
    async fn verify(&self) -> Result<BotIdentity, GatewayError>;

    /// Next batch of inbound events, in platform order. May block for the
    /// long-poll timeout and return an empty batch.
    async fn poll(&self) -> Result<Vec<InboundEvent>, GatewayError>;

    async fn send_text(&self, chat_id: ChatId, text: &str, format: TextFormat) -> Result<(), GatewayError>;

    async fn send_typing(&self, chat_id: ChatId) -> Result<(), GatewayError>;
}

/// Splits `text` into pieces of at most `limit` UTF-16 code units, the unit
/// Telegram measures message length in. A piece breaks after its last newline
/// when that newline sits in its second half.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.encode_utf16().count() <= limit {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let mut units = 0;
        let mut end = rest.len();
        let mut newline_end = None;
        for (idx, c) in rest.char_indices() {
            let width = c.len_utf16();
            // A single char wider than the limit still goes out on its own.
            if idx > 0 && units + width > limit {
                end = idx;
                break;
            }
            if c == '\n' && units >= limit / 2 {
                newline_end = Some(idx + 1);
            }
            units += width;
        }
        if end < rest.len() {
            if let Some(newline_end) = newline_end {
                end = newline_end;
            }
        }
        parts.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_part() {
        assert_eq!(split_message("hello", 10), vec!["hello".to_string()]);
        assert_eq!(split_message("", 10), vec![String::new()]);
    }

    #[test]
    fn splits_on_character_boundaries() {
        let text = "é".repeat(25);
        let parts = split_message(&text, 10);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.chars().count() <= 10));
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn prefers_newline_breaks() {
        let text = "aaaaaaa\nbbbbbbbbbb";
        let parts = split_message(text, 10);
        assert_eq!(parts, vec!["aaaaaaa\n".to_string(), "bbbbbbbbbb".to_string()]);
    }

    #[test]
    fn limit_counts_utf16_units() {
        let text = "😀".repeat(5);
        let parts = split_message(&text, 4);
        assert_eq!(parts, vec!["😀😀".to_string(), "😀😀".to_string(), "😀".to_string()]);
        assert!(parts.iter().all(|p| p.encode_utf16().count() <= 4));
    }

    #[test]
    fn char_wider_than_limit_is_sent_alone() {
        assert_eq!(split_message("😀😀", 1), vec!["😀".to_string(), "😀".to_string()]);
    }
}

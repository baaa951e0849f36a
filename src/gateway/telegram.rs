//! Telegram Bot API over long-polling.

use async_trait::async_trait;
use governor::{ clock::DefaultClock, state::{ InMemoryState, NotKeyed }, Quota, RateLimiter };
use log::{ debug, warn };
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::atomic::{ AtomicI64, Ordering };
use std::time::Duration;

use super::{ split_message, BotIdentity, ChatGateway, ChatId, GatewayError, InboundEvent, MessageKind, TextFormat };

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
/// Telegram rejects messages longer than this many UTF-16 code units.
pub const MAX_MESSAGE_UNITS: usize = 4096;
const API_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct TelegramUser {
    id: i64,
    first_name: Option<String>,
    username: Option<String>,
}

#[derive(Deserialize)]
struct TelegramChat {
    id: i64,
}

#[derive(Deserialize)]
struct TelegramMessage {
    from: Option<TelegramUser>,
    chat: TelegramChat,
    text: Option<String>,
    sticker: Option<serde_json::Value>,
    photo: Option<Vec<serde_json::Value>>,
    voice: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
}

pub struct TelegramGateway {
    client: Client,
    api_url: String,
    bot_token: String,
    poll_timeout: u32,
    last_update_id: AtomicI64,
    send_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl TelegramGateway {
    pub fn new(
        bot_token: impl Into<String>,
        api_url: Option<String>,
        poll_timeout: u32,
        sends_per_second: u32
    ) -> Result<Self, GatewayError> {
        let bot_token = bot_token.into();
        if bot_token.trim().is_empty() {
            return Err(GatewayError::Config("TELEGRAM_BOT_TOKEN is missing".to_string()));
        }
        let rate = NonZeroU32::new(sends_per_second).ok_or_else(||
            GatewayError::Config("send rate must be at least 1 message per second".to_string())
        )?;

        Ok(Self {
            client: Client::new(),
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            bot_token,
            poll_timeout,
            last_update_id: AtomicI64::new(0),
            send_limiter: RateLimiter::direct(Quota::per_second(rate)),
        })
    }

    pub fn last_update_id(&self) -> i64 {
        self.last_update_id.load(Ordering::SeqCst)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url.trim_end_matches('/'), self.bot_token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
        timeout: Duration
    ) -> Result<T, GatewayError> {
        let resp = self.client
            .post(self.method_url(method))
            .json(&params)
            .timeout(timeout)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;

        match serde_json::from_str::<TelegramResponse<T>>(&body) {
            Ok(TelegramResponse { ok: true, result: Some(result), .. }) => Ok(result),
            Ok(TelegramResponse { ok: true, result: None, .. }) =>
                Err(GatewayError::Api {
                    description: format!("{} returned ok but no result", method),
                }),
            Ok(TelegramResponse { description, .. }) =>
                Err(GatewayError::Api {
                    description: description.unwrap_or_else(|| format!("{} failed with HTTP {}", method, status)),
                }),
            Err(e) => {
                debug!("Unparseable {} response ({}): {}", method, status, body);
                Err(GatewayError::Api {
                    description: format!("{} returned HTTP {}: {}", method, status, e),
                })
            }
        }
    }

    fn convert_update(update: TelegramUpdate) -> Option<InboundEvent> {
        let message = update.message?;
        let from = message.from?;

        let kind = if let Some(text) = message.text {
            MessageKind::Text(text)
        } else if message.sticker.is_some() {
            MessageKind::Sticker
        } else if message.photo.is_some() {
            MessageKind::Photo
        } else if message.voice.is_some() {
            MessageKind::Voice
        } else {
            MessageKind::Unsupported
        };

        Some(InboundEvent {
            chat_id: message.chat.id,
            user_id: from.id,
            first_name: from.first_name,
            kind,
        })
    }
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn verify(&self) -> Result<BotIdentity, GatewayError> {
        let me: TelegramUser = self.call("getMe", serde_json::json!({}), API_TIMEOUT).await?;
        Ok(BotIdentity { id: me.id, username: me.username })
    }

    async fn poll(&self) -> Result<Vec<InboundEvent>, GatewayError> {
        let last = self.last_update_id.load(Ordering::SeqCst);
        let params = serde_json::json!({
            "offset": if last > 0 { last + 1 } else { 0 },
            "timeout": self.poll_timeout,
            "allowed_updates": ["message"],
        });
        let timeout = Duration::from_secs(u64::from(self.poll_timeout) + 10);
        let updates: Vec<TelegramUpdate> = self.call("getUpdates", params, timeout).await?;

        if let Some(newest) = updates.iter().map(|u| u.update_id).max() {
            self.last_update_id.fetch_max(newest, Ordering::SeqCst);
        }

        Ok(updates.into_iter().filter_map(Self::convert_update).collect())
    }

    async fn send_text(&self, chat_id: ChatId, text: &str, format: TextFormat) -> Result<(), GatewayError> {
        for part in split_message(text, MAX_MESSAGE_UNITS) {
            self.send_limiter.until_ready().await;
            let mut params = serde_json::json!({
                "chat_id": chat_id,
                "text": part,
            });
            if format == TextFormat::Markdown {
                params["parse_mode"] = serde_json::Value::String("Markdown".to_string());
            }
            let _: serde_json::Value = self.call("sendMessage", params, API_TIMEOUT).await?;
        }
        Ok(())
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<(), GatewayError> {
        self.send_limiter.until_ready().await;
        let params = serde_json::json!({ "chat_id": chat_id, "action": "typing" });
        let sent: bool = self.call("sendChatAction", params, API_TIMEOUT).await?;
        if !sent {
            warn!("sendChatAction for chat {} returned false", chat_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{ body_partial_json, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    fn gateway(server: &MockServer) -> TelegramGateway {
        TelegramGateway::new("123:abc", Some(server.uri()), 0, 100).unwrap()
    }

    #[test]
    fn rejects_empty_token_and_zero_rate() {
        assert!(matches!(TelegramGateway::new(" ", None, 30, 25), Err(GatewayError::Config(_))));
        assert!(matches!(TelegramGateway::new("t", None, 30, 0), Err(GatewayError::Config(_))));
    }

    #[tokio::test]
    async fn verify_reads_bot_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getMe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": { "id": 42, "is_bot": true, "first_name": "Relay", "username": "relay_bot" }
            })))
            .mount(&server).await;

        let me = gateway(&server).verify().await.unwrap();
        assert_eq!(me, BotIdentity { id: 42, username: Some("relay_bot".into()) });
    }

    #[tokio::test]
    async fn unauthorized_token_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "ok": false, "error_code": 401, "description": "Unauthorized"
            })))
            .mount(&server).await;

        let err = gateway(&server).verify().await.unwrap_err();
        assert!(matches!(err, GatewayError::Api { ref description } if description == "Unauthorized"));
    }

    #[tokio::test]
    async fn poll_converts_updates_and_advances_offset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .and(body_partial_json(json!({ "offset": 0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    { "update_id": 10, "message": {
                        "message_id": 1, "chat": { "id": 500 },
                        "from": { "id": 7, "first_name": "Ada" }, "text": "hello" } },
                    { "update_id": 11, "message": {
                        "message_id": 2, "chat": { "id": 500 },
                        "from": { "id": 7, "first_name": "Ada" }, "sticker": { "file_id": "x" } } },
                    { "update_id": 12, "message": {
                        "message_id": 3, "chat": { "id": -100 }, "text": "channel post" } },
                    { "update_id": 13 }
                ]
            })))
            .expect(1)
            .mount(&server).await;

        let gateway = gateway(&server);
        let events = gateway.poll().await.unwrap();
        assert_eq!(events, vec![
            InboundEvent { chat_id: 500, user_id: 7, first_name: Some("Ada".into()), kind: MessageKind::Text("hello".into()) },
            InboundEvent { chat_id: 500, user_id: 7, first_name: Some("Ada".into()), kind: MessageKind::Sticker },
        ]);
        assert_eq!(gateway.last_update_id(), 13);
    }

    #[tokio::test]
    async fn markdown_replies_set_parse_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(json!({ "chat_id": 500, "text": "*hi*", "parse_mode": "Markdown" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "result": { "message_id": 9 }
            })))
            .expect(1)
            .mount(&server).await;

        gateway(&server).send_text(500, "*hi*", TextFormat::Markdown).await.unwrap();
    }

    #[tokio::test]
    async fn long_replies_are_sent_in_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "result": { "message_id": 9 }
            })))
            .expect(2)
            .mount(&server).await;

        let text = "x".repeat(MAX_MESSAGE_UNITS + 1);
        gateway(&server).send_text(500, &text, TextFormat::Plain).await.unwrap();
    }

    #[tokio::test]
    async fn typing_action_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendChatAction"))
            .and(body_partial_json(json!({ "chat_id": 500, "action": "typing" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })))
            .expect(1)
            .mount(&server).await;

        gateway(&server).send_typing(500).await.unwrap();
    }
}

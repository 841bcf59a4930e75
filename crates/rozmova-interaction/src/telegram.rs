//! Long-polling Telegram Bot API gateway.
//!
//! Wraps `getUpdates` polling plus the send endpoints behind the core's
//! [`MessagingGateway`] trait. Updates are classified into engine events:
//! slash commands, inline-button callbacks, free text and voice messages.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use rozmova_core::dialogue::{EventKind, InboundEvent};
use rozmova_core::service::{AudioBlob, ImageRef, MessagingGateway};
use rozmova_core::session::ChatId;
use rozmova_core::{Result, RozmovaError};
use rozmova_infrastructure::SecretStorage;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::VecDeque;
use std::env;
use tokio::sync::Mutex;

const POLL_TIMEOUT_SECS: u32 = 30;

/// Telegram transport over the Bot HTTP API.
pub struct TelegramGateway {
    client: Client,
    base_url: String,
    file_url: String,
    offset: Mutex<i64>,
    pending: Mutex<VecDeque<InboundEvent>>,
}

impl TelegramGateway {
    /// Creates a gateway with the provided bot token.
    pub fn new(token: impl AsRef<str>) -> Self {
        let token = token.as_ref();
        Self {
            client: Client::new(),
            base_url: format!("https://api.telegram.org/bot{token}"),
            file_url: format!("https://api.telegram.org/file/bot{token}"),
            offset: Mutex::new(0),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Loads the bot token from the secret file or the `TELEGRAM_BOT_TOKEN`
    /// environment variable.
    pub fn try_from_env() -> Result<Self> {
        if let Ok(storage) = SecretStorage::new() {
            if let Ok(secret_config) = storage.load() {
                if let Some(telegram) = secret_config.telegram {
                    return Ok(Self::new(telegram.bot_token));
                }
            }
        }

        let token = env::var("TELEGRAM_BOT_TOKEN").map_err(|_| {
            RozmovaError::config(
                "TELEGRAM_BOT_TOKEN not found in ~/.config/rozmova/secret.json or environment",
            )
        })?;
        Ok(Self::new(token))
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|err| RozmovaError::gateway(format!("{method} request failed: {err}")))?;
        Self::into_result(method, response).await
    }

    async fn call_multipart<T: DeserializeOwned>(&self, method: &str, form: Form) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|err| RozmovaError::gateway(format!("{method} request failed: {err}")))?;
        Self::into_result(method, response).await
    }

    async fn into_result<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RozmovaError::gateway(format!(
                "{method} returned HTTP {status}: {body}"
            )));
        }
        let wrapper: ApiResponse<T> = response.json().await.map_err(|err| {
            RozmovaError::gateway(format!("failed to parse {method} response: {err}"))
        })?;
        if !wrapper.ok {
            return Err(RozmovaError::gateway(format!(
                "{method} failed: {}",
                wrapper.description.unwrap_or_default()
            )));
        }
        wrapper
            .result
            .ok_or_else(|| RozmovaError::gateway(format!("{method} returned no result")))
    }

    /// Downloads the raw bytes of an uploaded file.
    async fn download_file(&self, file_id: &str) -> Result<AudioBlob> {
        let info: FileInfo = self
            .call("getFile", json!({ "file_id": file_id }))
            .await?;
        let path = info
            .file_path
            .ok_or_else(|| RozmovaError::gateway("getFile returned no file_path"))?;

        let response = self
            .client
            .get(format!("{}/{path}", self.file_url))
            .send()
            .await
            .map_err(|err| RozmovaError::gateway(format!("file download failed: {err}")))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RozmovaError::gateway(format!("file download failed: {err}")))?;
        Ok(AudioBlob(bytes.to_vec()))
    }

    /// Converts one update into an engine event, advancing the offset.
    async fn to_event(&self, update: Update) -> Option<InboundEvent> {
        if let Some(callback) = update.callback_query {
            // Acknowledge so the client stops showing a spinner; a failed
            // ack is not worth dropping the press over.
            let ack: Result<bool> = self
                .call("answerCallbackQuery", json!({ "callback_query_id": callback.id }))
                .await;
            if let Err(err) = ack {
                tracing::warn!(error = %err, "callback acknowledgement failed");
            }

            let chat_id = callback.message.map(|m| m.chat.id)?;
            let token = callback.data?;
            return Some(InboundEvent {
                chat_id,
                kind: EventKind::ButtonPress(token),
            });
        }

        let message = update.message?;
        let chat_id = message.chat.id;

        if let Some(voice) = message.voice {
            match self.download_file(&voice.file_id).await {
                Ok(audio) => {
                    return Some(InboundEvent {
                        chat_id,
                        kind: EventKind::Voice(audio),
                    });
                }
                Err(err) => {
                    tracing::warn!(chat_id, error = %err, "voice download failed");
                    return None;
                }
            }
        }

        let text = message.text?;
        Some(InboundEvent {
            chat_id,
            kind: classify_text(&text),
        })
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let _: Message = self
            .call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }

    async fn send_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: &[(String, String)],
    ) -> Result<()> {
        let keyboard: Vec<Vec<serde_json::Value>> = buttons
            .iter()
            .map(|(token, label)| vec![json!({ "text": label, "callback_data": token })])
            .collect();
        let body = json!({
            "chat_id": chat_id,
            "text": text,
            "reply_markup": { "inline_keyboard": keyboard },
        });
        let _: Message = self.call("sendMessage", body).await?;
        Ok(())
    }

    async fn send_image(&self, chat_id: ChatId, image: &ImageRef) -> Result<()> {
        let bytes = tokio::fs::read(&image.0)
            .await
            .map_err(|err| RozmovaError::gateway(format!("failed to read image: {err}")))?;
        let file_name = image
            .0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", Part::bytes(bytes).file_name(file_name));
        let _: Message = self.call_multipart("sendPhoto", form).await?;
        Ok(())
    }

    async fn send_voice(&self, chat_id: ChatId, audio: &AudioBlob) -> Result<()> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("voice", Part::bytes(audio.0.clone()).file_name("voice.ogg"));
        let _: Message = self.call_multipart("sendVoice", form).await?;
        Ok(())
    }

    async fn next_event(&self) -> Result<InboundEvent> {
        loop {
            if let Some(event) = self.pending.lock().await.pop_front() {
                return Ok(event);
            }

            let offset = *self.offset.lock().await;
            let updates: Vec<Update> = self
                .call(
                    "getUpdates",
                    json!({ "offset": offset, "timeout": POLL_TIMEOUT_SECS }),
                )
                .await?;

            let mut pending = self.pending.lock().await;
            for update in updates {
                let next_offset = update.update_id + 1;
                {
                    let mut offset = self.offset.lock().await;
                    if next_offset > *offset {
                        *offset = next_offset;
                    }
                }
                if let Some(event) = self.to_event(update).await {
                    pending.push_back(event);
                }
            }
        }
    }
}

/// Classifies a text message: a leading slash makes it a command (bot
/// mentions like `/start@RozmovaBot` are stripped), anything else is free
/// text.
fn classify_text(text: &str) -> EventKind {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix('/') {
        let name = rest
            .split_whitespace()
            .next()
            .unwrap_or("")
            .split('@')
            .next()
            .unwrap_or("")
            .to_string();
        return EventKind::Command(name);
    }
    EventKind::Text(trimmed.to_string())
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
    callback_query: Option<CallbackQuery>,
}

#[derive(Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
    voice: Option<Voice>,
}

#[derive(Deserialize)]
struct Chat {
    id: ChatId,
}

#[derive(Deserialize)]
struct Voice {
    file_id: String,
}

#[derive(Deserialize)]
struct CallbackQuery {
    id: String,
    data: Option<String>,
    message: Option<Message>,
}

#[derive(Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

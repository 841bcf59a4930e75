//! Messaging gateway trait.
//!
//! The chat transport (message delivery, button rendering, file and voice
//! upload/download) behind an opaque interface.

use crate::dialogue::event::InboundEvent;
use crate::error::Result;
use crate::session::ChatId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reference to an image in local storage, resolved by the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef(pub PathBuf);

/// Opaque audio payload exchanged with the transport and the voice codec.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioBlob(pub Vec<u8>);

impl std::fmt::Debug for AudioBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AudioBlob").field(&self.0.len()).finish()
    }
}

/// An abstract chat transport the engine emits output through.
///
/// Button tokens are opaque strings matched against the engine's transition
/// table; unmatched tokens fall back to an "unknown command" reply in the
/// current state.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Sends a plain text message.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Sends a text message with an ordered inline button list of
    /// `(token, label)` pairs.
    async fn send_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: &[(String, String)],
    ) -> Result<()>;

    /// Sends an image.
    async fn send_image(&self, chat_id: ChatId, image: &ImageRef) -> Result<()>;

    /// Sends a voice message.
    async fn send_voice(&self, chat_id: ChatId, audio: &AudioBlob) -> Result<()>;

    /// Waits for the next inbound event from any chat.
    async fn next_event(&self) -> Result<InboundEvent>;
}

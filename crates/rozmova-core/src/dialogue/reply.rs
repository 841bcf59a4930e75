//! Reply payloads produced by dialogue handlers.

use crate::service::{AudioBlob, ImageRef};

/// What a handler wants delivered back to the chat.
///
/// An optional image goes out first, then the voice message if present, then
/// the text (with buttons when non-empty).
#[derive(Debug, Clone, Default)]
pub struct Reply {
    /// Main text body.
    pub text: String,
    /// Mode illustration, sent before the text.
    pub image: Option<ImageRef>,
    /// Ordered inline buttons as `(token, label)` pairs.
    pub buttons: Vec<(String, String)>,
    /// Synthesized voice answer, if any.
    pub voice: Option<AudioBlob>,
}

impl Reply {
    /// Creates a plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Attaches an optional image.
    pub fn with_image(mut self, image: Option<ImageRef>) -> Self {
        self.image = image;
        self
    }

    /// Attaches inline buttons.
    pub fn with_buttons(mut self, buttons: Vec<(String, String)>) -> Self {
        self.buttons = buttons;
        self
    }

    /// Attaches a voice message.
    pub fn with_voice(mut self, voice: AudioBlob) -> Self {
        self.voice = Some(voice);
        self
    }
}

//! Voice codec trait.
//!
//! Speech-to-text and text-to-speech behind an opaque interface.

use super::gateway::AudioBlob;
use crate::error::Result;
use async_trait::async_trait;

/// Result of a transcription attempt.
///
/// Absence of speech is a value, not an error: the dialogue stays in voice
/// mode and asks the user to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Recognized speech.
    Text(String),
    /// The codec found no speech in the audio.
    NoSpeech,
}

/// An abstract speech converter.
#[async_trait]
pub trait VoiceCodec: Send + Sync {
    /// Transcribes an audio blob to text.
    async fn transcribe(&self, audio: &AudioBlob, language_hint: &str) -> Result<Transcript>;

    /// Synthesizes spoken audio from text.
    async fn synthesize(&self, text: &str, language_hint: &str) -> Result<AudioBlob>;
}

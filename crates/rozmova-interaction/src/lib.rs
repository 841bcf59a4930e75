//! Interaction layer: concrete clients behind the core's collaborator
//! traits.
//!
//! - `openai_chat`: chat completions over the OpenAI REST API
//! - `openai_voice`: Whisper transcription and TTS synthesis
//! - `telegram`: long-polling Telegram Bot API gateway

pub mod openai_chat;
pub mod openai_voice;
pub mod telegram;

pub use openai_chat::OpenAiChatClient;
pub use openai_voice::OpenAiVoiceClient;
pub use telegram::TelegramGateway;

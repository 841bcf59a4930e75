//! Infrastructure layer: filesystem-backed content loading and secret
//! configuration storage.

pub mod content;
pub mod paths;
pub mod secret;

pub use content::FsContentStore;
pub use secret::{OpenAiSecret, SecretConfig, SecretStorage, TelegramSecret};

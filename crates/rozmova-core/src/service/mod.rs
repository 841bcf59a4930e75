//! External collaborator interfaces.
//!
//! The chat transport, the completion endpoint, the speech converter and the
//! static-content loader are thin I/O wrappers specified only by their
//! call/return contracts. Concrete implementations live outside the core.

mod completion;
mod content;
mod gateway;
mod voice;

pub use completion::CompletionService;
pub use content::ContentStore;
pub use gateway::{AudioBlob, ImageRef, MessagingGateway};
pub use voice::{Transcript, VoiceCodec};

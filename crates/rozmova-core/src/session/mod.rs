//! Session domain module.
//!
//! This module contains the per-chat session model, conversation message
//! types and the in-memory session store.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`, `QuizState`)
//! - `message`: Conversation message types (`Role`, `ChatMessage`)
//! - `store`: Chat-scoped in-memory store (`SessionStore`)

mod message;
mod model;
mod store;

// Re-export public API
pub use message::{ChatMessage, Role};
pub use model::{ChatId, QuizState, Session, TranslateState};
pub use store::SessionStore;

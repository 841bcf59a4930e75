//! Rozmova core: the dialogue state machine, per-chat session store and
//! quiz answer matcher, together with the collaborator interfaces for the
//! chat transport, the completion endpoint, the voice codec and the static
//! content store.

pub mod dialogue;
pub mod error;
pub mod menu;
pub mod quiz;
pub mod service;
pub mod session;

// Re-export common error type
pub use error::{Result, RozmovaError};

//! Content store trait.
//!
//! Loads static prompt/message text and mode illustrations by key.

use super::gateway::ImageRef;
use async_trait::async_trait;

/// An abstract store of static user-facing texts and prompts.
///
/// Missing keys return empty text rather than failing: callers treat an
/// empty prompt as a soft degrade, never a crash.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Loads a user-facing message text by key.
    async fn load_message(&self, key: &str) -> String;

    /// Loads a system/instruction prompt by key.
    async fn load_prompt(&self, key: &str) -> String;

    /// Resolves a mode illustration by key, if one exists.
    async fn load_image(&self, key: &str) -> Option<ImageRef>;
}

//! Completion service trait.
//!
//! Defines the interface to the external text-generation collaborator.

use crate::error::Result;
use crate::session::ChatMessage;
use async_trait::async_trait;

/// An abstract text-completion endpoint consuming role-tagged history.
///
/// Each call is a fresh request carrying the full message history it needs;
/// the service is stateless from the engine's perspective. Failures surface
/// as [`RozmovaError::Completion`](crate::RozmovaError::Completion) carrying
/// a human-readable cause. The engine never retries automatically beyond the
/// quiz-question de-duplication loop.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends the ordered message list to the model and returns its reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

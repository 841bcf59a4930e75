//! Inbound event types.

use crate::service::AudioBlob;
use crate::session::ChatId;

/// Command that fully resets the session and shows the main menu.
pub const CMD_START: &str = "start";
/// Top-level cancel command terminating the dialogue for the chat.
pub const CMD_STOP: &str = "stop";

/// An inbound event delivered by the messaging gateway.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// The chat the event belongs to.
    pub chat_id: ChatId,
    /// The event payload.
    pub kind: EventKind,
}

/// Kind of inbound event, as classified by the transport.
#[derive(Debug, Clone)]
pub enum EventKind {
    /// A slash command, without the leading slash.
    Command(String),
    /// A button press carrying its opaque token.
    ButtonPress(String),
    /// Free text typed by the user.
    Text(String),
    /// A voice message.
    Voice(AudioBlob),
}

impl InboundEvent {
    /// Returns true for the top-level cancel command, which is honored even
    /// while a handler for the same chat is in flight.
    pub fn is_cancel(&self) -> bool {
        matches!(&self.kind, EventKind::Command(cmd) if cmd == CMD_STOP)
    }
}

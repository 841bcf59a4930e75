//! Dialogue state machine module.
//!
//! # Module Structure
//!
//! - `state`: FSM state and mode enums (`DialogueState`, `Mode`)
//! - `event`: Inbound event types (`InboundEvent`, `EventKind`)
//! - `reply`: Handler reply payloads (`Reply`)
//! - `engine`: The finite-state controller (`DialogueEngine`)
//! - `dispatch`: Per-chat serialization (`Dispatcher`)

pub mod dispatch;
pub mod engine;
pub mod event;
pub mod reply;
pub mod state;

#[cfg(test)]
mod engine_test;

// Re-export public API
pub use dispatch::Dispatcher;
pub use engine::DialogueEngine;
pub use event::{CMD_START, CMD_STOP, EventKind, InboundEvent};
pub use reply::Reply;
pub use state::{DialogueState, Mode};

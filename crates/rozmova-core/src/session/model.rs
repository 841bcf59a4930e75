//! Session domain model.
//!
//! This module contains the core Session entity that represents the mutable
//! per-chat state tracked by the [`SessionStore`](super::SessionStore).

use super::message::ChatMessage;
use crate::dialogue::state::{DialogueState, Mode};
use crate::menu::{Language, QuizTheme};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Opaque chat identifier, the unit of session isolation.
pub type ChatId = i64;

/// Quiz progress for one chat.
///
/// Asked questions are scoped per theme: switching theme does not clear the
/// log of other themes in the same chat. The correct-answer counter survives
/// theme switches and only resets on a full session reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizState {
    /// Currently selected topic, if any.
    pub theme: Option<QuizTheme>,
    /// Previously generated question texts, keyed by theme.
    pub asked: HashMap<QuizTheme, HashSet<String>>,
    /// Accepted answers for the current question (lowercase, at most two
    /// words each).
    pub accepted_answers: Vec<String>,
    /// Monotonically increasing count of correct answers.
    pub correct_count: u32,
}

/// Translation-mode state for one chat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslateState {
    /// Stored target language, set when the user picks one from the list.
    pub target: Option<Language>,
}

/// Represents one chat's session in the application's domain layer.
///
/// A session contains:
/// - The current FSM state and active mode
/// - The conversation history mirrored to the completion service
/// - Quiz progress and translation-mode state
/// - An epoch counter used to detect concurrent resets
///
/// This is the "pure" domain model that the dialogue engine operates on,
/// independent of any storage mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Current FSM state.
    pub state: DialogueState,
    /// Active conversational mode, if any.
    pub mode: Option<Mode>,
    /// Ordered conversation history; append-only except on explicit reset.
    pub history: Vec<ChatMessage>,
    /// Quiz progress.
    pub quiz: QuizState,
    /// Translation-mode state.
    pub translate: TranslateState,
    /// Generation counter, bumped on every full reset or termination.
    ///
    /// A handler captures the epoch before a long upstream call; the store
    /// refuses the eventual state commit if the epoch moved on, so a cancel
    /// issued mid-flight wins over the stale transition.
    pub epoch: u64,
    /// Timestamp when the session was created (ISO 8601 format).
    pub created_at: String,
}

impl Session {
    /// Creates a fresh session in the initial `Main` state.
    pub fn new() -> Self {
        Self {
            state: DialogueState::Main,
            mode: None,
            history: Vec::new(),
            quiz: QuizState::default(),
            translate: TranslateState::default(),
            epoch: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

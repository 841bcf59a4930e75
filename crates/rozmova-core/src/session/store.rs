//! In-memory session store.
//!
//! Owns the per-chat session map, the only shared mutable state in the core.
//! Every operation is chat-scoped; no call reads or writes another chat's
//! state. The store is injected into the dialogue engine, there are no
//! process-wide singletons.
//!
//! Mutating operations take the epoch captured when the handler started and
//! become no-ops once a full reset (or the top-level cancel) bumped it, so a
//! handler resuming after a long upstream call cannot write into a session
//! the user has already left.

use super::message::ChatMessage;
use super::model::{ChatId, Session};
use crate::dialogue::state::{DialogueState, Mode};
use crate::menu::{Language, QuizTheme};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Stores per-chat conversational history, quiz progress and FSM state.
///
/// Sessions are created lazily on first access.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<ChatId, Session>>>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the chat's session, creating a default one if
    /// absent.
    pub async fn session(&self, chat_id: ChatId) -> Session {
        let mut sessions = self.sessions.write().await;
        sessions.entry(chat_id).or_default().clone()
    }

    /// Returns the chat's current FSM state.
    pub async fn state(&self, chat_id: ChatId) -> DialogueState {
        let mut sessions = self.sessions.write().await;
        sessions.entry(chat_id).or_default().state
    }

    /// Runs a mutation if the session epoch still matches the one captured
    /// when the handler started. Returns whether the mutation was applied.
    async fn mutate(&self, chat_id: ChatId, epoch: u64, f: impl FnOnce(&mut Session)) -> bool {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(chat_id).or_default();
        if session.epoch != epoch {
            tracing::debug!(chat_id, epoch, "stale session mutation dropped");
            return false;
        }
        f(session);
        true
    }

    /// Applies a state transition if the epoch still matches.
    ///
    /// Returns `false` (and leaves the session untouched) when a reset or
    /// termination happened in between; the handler's reply may still be
    /// delivered, but the stale transition is dropped.
    pub async fn commit_state(
        &self,
        chat_id: ChatId,
        epoch: u64,
        state: DialogueState,
        mode: Option<Mode>,
    ) -> bool {
        self.mutate(chat_id, epoch, |session| {
            session.state = state;
            session.mode = mode;
        })
        .await
    }

    /// Clears the conversation history along with the quiz question log and
    /// the current-question state.
    ///
    /// The correct-answer counter is deliberately left alone: it only resets
    /// on a full session reset, not on mode entry.
    pub async fn clear_history(&self, chat_id: ChatId, epoch: u64) -> bool {
        self.mutate(chat_id, epoch, |session| {
            session.history.clear();
            session.quiz.theme = None;
            session.quiz.asked.clear();
            session.quiz.accepted_answers.clear();
            tracing::debug!(chat_id, "history cleared");
        })
        .await
    }

    /// Appends a message to the chat's history in arrival order.
    pub async fn append_message(&self, chat_id: ChatId, epoch: u64, message: ChatMessage) -> bool {
        self.mutate(chat_id, epoch, |session| session.history.push(message))
            .await
    }

    /// Records a generated quiz question for the given theme.
    pub async fn record_question(
        &self,
        chat_id: ChatId,
        epoch: u64,
        theme: QuizTheme,
        question: &str,
    ) -> bool {
        self.mutate(chat_id, epoch, |session| {
            session
                .quiz
                .asked
                .entry(theme)
                .or_default()
                .insert(question.to_string());
        })
        .await
    }

    /// Checks whether a question was already posed for this chat and theme.
    pub async fn was_question_asked(
        &self,
        chat_id: ChatId,
        theme: QuizTheme,
        question: &str,
    ) -> bool {
        let sessions = self.sessions.read().await;
        sessions
            .get(&chat_id)
            .and_then(|s| s.quiz.asked.get(&theme))
            .is_some_and(|asked| asked.contains(question))
    }

    /// Stores the accepted-answer set for the current question.
    pub async fn set_accepted_answers(
        &self,
        chat_id: ChatId,
        epoch: u64,
        answers: Vec<String>,
    ) -> bool {
        self.mutate(chat_id, epoch, |session| {
            session.quiz.accepted_answers = answers;
        })
        .await
    }

    /// Returns the accepted-answer set for the current question.
    pub async fn accepted_answers(&self, chat_id: ChatId) -> Vec<String> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&chat_id)
            .map(|s| s.quiz.accepted_answers.clone())
            .unwrap_or_default()
    }

    /// Stores the currently selected quiz theme.
    pub async fn set_quiz_theme(&self, chat_id: ChatId, epoch: u64, theme: QuizTheme) -> bool {
        self.mutate(chat_id, epoch, |session| session.quiz.theme = Some(theme))
            .await
    }

    /// Returns the currently selected quiz theme, if any.
    pub async fn quiz_theme(&self, chat_id: ChatId) -> Option<QuizTheme> {
        let sessions = self.sessions.read().await;
        sessions.get(&chat_id).and_then(|s| s.quiz.theme)
    }

    /// Increments the correct-answer counter, returning the new count.
    pub async fn increment_correct(&self, chat_id: ChatId) -> u32 {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(chat_id).or_default();
        session.quiz.correct_count += 1;
        session.quiz.correct_count
    }

    /// Returns the correct-answer count for this chat.
    pub async fn correct_count(&self, chat_id: ChatId) -> u32 {
        let sessions = self.sessions.read().await;
        sessions.get(&chat_id).map_or(0, |s| s.quiz.correct_count)
    }

    /// Stores the translation target language.
    pub async fn set_translate_target(
        &self,
        chat_id: ChatId,
        epoch: u64,
        target: Language,
    ) -> bool {
        self.mutate(chat_id, epoch, |session| {
            session.translate.target = Some(target);
        })
        .await
    }

    /// Returns the stored translation target language, if any.
    pub async fn translate_target(&self, chat_id: ChatId) -> Option<Language> {
        let sessions = self.sessions.read().await;
        sessions.get(&chat_id).and_then(|s| s.translate.target)
    }

    /// Fully resets the session to the top-level menu.
    ///
    /// Clears history, quiz progress (including the correct-answer counter)
    /// and translation state, sets the state back to `Main` and bumps the
    /// epoch so any in-flight handler's writes are dropped.
    ///
    /// Returns the new epoch.
    pub async fn reset(&self, chat_id: ChatId) -> u64 {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(chat_id).or_default();
        let epoch = session.epoch + 1;
        let created_at = session.created_at.clone();
        *session = Session {
            epoch,
            created_at,
            ..Session::new()
        };
        tracing::info!(chat_id, epoch, "session reset");
        epoch
    }

    /// Terminates the dialogue for this chat.
    ///
    /// Like [`reset`](Self::reset), but leaves the session in the terminal
    /// `Ended` state. The next inbound event is treated as a fresh session.
    pub async fn terminate(&self, chat_id: ChatId) -> u64 {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(chat_id).or_default();
        let epoch = session.epoch + 1;
        let created_at = session.created_at.clone();
        *session = Session {
            epoch,
            created_at,
            state: DialogueState::Ended,
            ..Session::new()
        };
        tracing::info!(chat_id, epoch, "dialogue terminated");
        epoch
    }
}

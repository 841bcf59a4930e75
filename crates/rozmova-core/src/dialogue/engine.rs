//! Dialogue engine: the per-chat finite-state controller.
//!
//! On each inbound event the engine looks up the chat's current state,
//! resolves the matching handler from an explicit `(state, event)` table,
//! executes it (zero to two completion-service calls), delivers the reply
//! through the messaging gateway and commits the next state.
//!
//! Handlers never mutate session state before their upstream calls succeed:
//! the dialogue does not advance, and history does not grow, on a failed
//! completion call. Every handler error is caught at the engine boundary and
//! converted to a readable user message without changing state.

use super::event::{CMD_START, CMD_STOP, EventKind, InboundEvent};
use super::reply::Reply;
use super::state::{DialogueState, Mode};
use crate::error::{Result, RozmovaError};
use crate::menu::{Language, Persona, QuizTheme};
use crate::quiz;
use crate::service::{
    CompletionService, ContentStore, MessagingGateway, Transcript, VoiceCodec,
};
use crate::session::{ChatId, ChatMessage, Session, SessionStore};
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;

/// Upper bound on the quiz de-duplication retry loop. After this many
/// attempts a possible duplicate is accepted rather than looping forever on
/// a persistently repeating model.
const MAX_QUESTION_ATTEMPTS: u32 = 5;

/// Maximum word count for a quiz answer; longer input is rejected locally
/// without any upstream call.
const MAX_ANSWER_WORDS: usize = 2;

/// Defensive timeout on completion-service calls so a hung upstream request
/// surfaces as a recoverable failure instead of stalling the chat's queue.
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(90);

/// Language hint for voice-chat transcription and synthesis.
const VOICE_LANGUAGE_HINT: &str = "uk";

// Button tokens not covered by the menu catalogs.
const BTN_MORE: &str = "more_btn";
const BTN_END: &str = "end_btn";
const BTN_SWITCH_PERSONA: &str = "talk";
const BTN_CHANGE_THEME: &str = "change_theme";

// Inline user-facing texts; the longer mode texts come from the content
// store.
const TEXT_UNKNOWN: &str = "Невідома команда. Скористайтесь кнопками нижче.";
const TEXT_PICK_THEME_FIRST: &str = "Спочатку оберіть тему квізу.";
const TEXT_ANSWER_TOO_LONG: &str =
    "Відповідь має містити не більше двох слів. Спробуйте ще раз.";
const TEXT_NO_SPEECH: &str = "Не вдалося розпізнати мовлення. Спробуйте ще раз.";
const TEXT_ENDED: &str = "Діалог завершено. Надішліть /start, щоб почати знову.";

// Menu texts must never be empty: `deliver` skips the text/buttons message
// for an empty body, which would swallow the button list and strand the chat
// in a choice state. Missing content-store texts fall back to these.
const TEXT_MAIN_FALLBACK: &str = "Оберіть, що робимо далі:";
const TEXT_TALK_FALLBACK: &str = "Оберіть особистість:";
const TEXT_QUIZ_FALLBACK: &str = "Оберіть тему квізу:";
const TEXT_TRANSLATE_FALLBACK: &str = "Оберіть мову перекладу:";

const LBL_END: &str = "Закінчити";
const LBL_MORE_FACT: &str = "Хочу ще факт";
const LBL_MORE_QUESTION: &str = "Ще питання";
const LBL_CHANGE_THEME: &str = "Змінити тему";
const LBL_SWITCH_PERSONA: &str = "Інша особистість";

/// What a handler decided: the reply to deliver and the state to commit.
#[derive(Debug)]
struct Outcome {
    reply: Reply,
    next: DialogueState,
    mode: Option<Mode>,
}

impl Outcome {
    fn new(reply: Reply, next: DialogueState, mode: Option<Mode>) -> Self {
        Self { reply, next, mode }
    }

    /// Keeps the session where it is while delivering a notice.
    fn stay(session: &Session, reply: Reply) -> Self {
        Self::new(reply, session.state, session.mode)
    }

    /// Keeps the session where it is and says nothing (events that carry no
    /// usable payload are ignored).
    fn silent(session: &Session) -> Self {
        Self::stay(session, Reply::default())
    }

    /// The "unknown command" fallback for unmatched input.
    fn unknown(session: &Session) -> Self {
        Self::stay(session, Reply::text(TEXT_UNKNOWN))
    }
}

/// The finite-state controller routing chat events through the mode menu.
pub struct DialogueEngine {
    store: SessionStore,
    completion: Arc<dyn CompletionService>,
    gateway: Arc<dyn MessagingGateway>,
    voice: Arc<dyn VoiceCodec>,
    content: Arc<dyn ContentStore>,
}

impl DialogueEngine {
    /// Creates an engine over injected collaborators.
    pub fn new(
        store: SessionStore,
        completion: Arc<dyn CompletionService>,
        gateway: Arc<dyn MessagingGateway>,
        voice: Arc<dyn VoiceCodec>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            store,
            completion,
            gateway,
            voice,
            content,
        }
    }

    /// The session store this engine mutates.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The gateway this engine emits output through.
    pub fn gateway(&self) -> &Arc<dyn MessagingGateway> {
        &self.gateway
    }

    /// Processes one inbound event to completion.
    ///
    /// Returns an error only for gateway delivery failures; handler errors
    /// are converted to a readable message for the user and swallowed here,
    /// leaving the session state unchanged.
    pub async fn handle_event(&self, event: InboundEvent) -> Result<()> {
        let chat_id = event.chat_id;
        let mut session = self.store.session(chat_id).await;

        // A terminated dialogue treats the next event as a fresh session.
        if session.state == DialogueState::Ended {
            self.store.reset(chat_id).await;
            session = self.store.session(chat_id).await;
        }

        let outcome = match self.dispatch(chat_id, &session, event.kind).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(chat_id, error = %err, "handler failed");
                self.gateway
                    .send_text(chat_id, &format!("Сталася помилка: {err}"))
                    .await?;
                return Ok(());
            }
        };

        self.deliver(chat_id, &outcome.reply).await?;
        self.store
            .commit_state(chat_id, session.epoch, outcome.next, outcome.mode)
            .await;
        Ok(())
    }

    /// The explicit `(state, event)` transition table.
    async fn dispatch(
        &self,
        chat_id: ChatId,
        session: &Session,
        kind: EventKind,
    ) -> Result<Outcome> {
        // Global commands first: /start resets from any state, /stop
        // terminates from any state. Any other command is routed like a
        // button token in the current state.
        let (token, text, audio) = match kind {
            EventKind::Command(cmd) if cmd == CMD_START => {
                return self.main_menu(chat_id).await;
            }
            EventKind::Command(cmd) if cmd == CMD_STOP => {
                return self.terminate(chat_id).await;
            }
            EventKind::Command(token) => {
                // Re-issuing the command for the already-active mode is a
                // no-op. "talk" as a button press is the switch-persona
                // action instead, so only commands are guarded.
                if session.mode.is_some() && Mode::from_token(&token) == session.mode {
                    return Ok(Outcome::silent(session));
                }
                (Some(token), None, None)
            }
            EventKind::ButtonPress(token) => (Some(token), None, None),
            EventKind::Text(text) => (None, Some(text), None),
            EventKind::Voice(audio) => (None, None, Some(audio)),
        };
        let token = token.as_deref();

        if token == Some(BTN_END) {
            return self.main_menu(chat_id).await;
        }

        match session.state {
            DialogueState::Main => match token.and_then(Mode::from_token) {
                Some(mode) => self.enter_mode(chat_id, session, mode).await,
                None => Ok(Outcome::unknown(session)),
            },
            DialogueState::Random => match token {
                Some(BTN_MORE) => self.random_fact(chat_id, session, false).await,
                _ => Ok(Outcome::unknown(session)),
            },
            DialogueState::Gpt => match text {
                Some(text) => {
                    self.chat_turn(chat_id, session, &text, vec![end_button()], DialogueState::Gpt)
                        .await
                }
                None => Ok(Outcome::unknown(session)),
            },
            DialogueState::TalkChoice => match token.and_then(Persona::from_token) {
                Some(persona) => self.select_persona(chat_id, session, persona).await,
                None => Ok(Outcome::unknown(session)),
            },
            DialogueState::TalkChat => match (token, text) {
                (_, Some(text)) => {
                    self.chat_turn(
                        chat_id,
                        session,
                        &text,
                        talk_buttons(),
                        DialogueState::TalkChat,
                    )
                    .await
                }
                (Some(BTN_SWITCH_PERSONA), _) => Ok(self.persona_list().await),
                _ => Ok(Outcome::unknown(session)),
            },
            DialogueState::QuizTheme => match token {
                Some(BTN_MORE) => match session.quiz.theme {
                    Some(theme) => self.pose_question(chat_id, session, theme).await,
                    None => Ok(Outcome::stay(session, Reply::text(TEXT_PICK_THEME_FIRST))),
                },
                Some(BTN_CHANGE_THEME) => Ok(self.theme_list().await),
                Some(t) => match QuizTheme::from_token(t) {
                    Some(theme) => self.pose_question(chat_id, session, theme).await,
                    None => Ok(Outcome::unknown(session)),
                },
                None => Ok(Outcome::unknown(session)),
            },
            DialogueState::QuizAnswer => match text {
                Some(text) => self.check_answer(chat_id, session, &text).await,
                None => Ok(Outcome::unknown(session)),
            },
            DialogueState::TranslateChoice => match token.and_then(Language::from_token) {
                Some(language) => self.select_language(chat_id, session, language).await,
                None => Ok(Outcome::unknown(session)),
            },
            DialogueState::TranslateInput => match text {
                Some(text) => self.translate_text(session, &text).await,
                None => Ok(Outcome::unknown(session)),
            },
            DialogueState::VoiceChat => match audio {
                Some(audio) => self.voice_turn(chat_id, session, audio).await,
                None => Ok(Outcome::unknown(session)),
            },
            // handle_event resets Ended sessions before dispatching.
            DialogueState::Ended => Ok(Outcome::unknown(session)),
        }
    }

    // ------------------------------------------------------------------
    // Top-level transitions
    // ------------------------------------------------------------------

    /// Full session reset followed by the main menu.
    async fn main_menu(&self, chat_id: ChatId) -> Result<Outcome> {
        self.store.reset(chat_id).await;
        let text = or_fallback(self.content.load_message("main").await, TEXT_MAIN_FALLBACK);
        let buttons = Mode::iter()
            .map(|mode| (mode.token().to_string(), mode.label().to_string()))
            .collect();
        let reply = Reply::text(text)
            .with_image(self.content.load_image("main").await)
            .with_buttons(buttons);
        Ok(Outcome::new(reply, DialogueState::Main, None))
    }

    /// Terminates the dialogue for this chat (top-level cancel).
    async fn terminate(&self, chat_id: ChatId) -> Result<Outcome> {
        self.store.terminate(chat_id).await;
        Ok(Outcome::new(
            Reply::text(TEXT_ENDED),
            DialogueState::Ended,
            None,
        ))
    }

    /// Routes a main-menu selection to the mode-entry handler.
    async fn enter_mode(&self, chat_id: ChatId, session: &Session, mode: Mode) -> Result<Outcome> {
        tracing::info!(chat_id, ?mode, "entering mode");
        match mode {
            Mode::Random => self.random_fact(chat_id, session, true).await,
            Mode::Gpt => self.enter_gpt(chat_id, session).await,
            Mode::Talk => {
                self.store.clear_history(chat_id, session.epoch).await;
                Ok(self.persona_list().await)
            }
            Mode::Quiz => {
                self.store.clear_history(chat_id, session.epoch).await;
                Ok(self.theme_list().await)
            }
            Mode::Translate => {
                self.store.clear_history(chat_id, session.epoch).await;
                Ok(self.language_list().await)
            }
            Mode::Voice => self.enter_voice(chat_id, session).await,
        }
    }

    // ------------------------------------------------------------------
    // Random-fact mode
    // ------------------------------------------------------------------

    /// Generates a random fact; on first entry the mode text and image are
    /// included.
    async fn random_fact(
        &self,
        chat_id: ChatId,
        session: &Session,
        entering: bool,
    ) -> Result<Outcome> {
        let prompt = self.content.load_prompt("random").await;
        let fact = self.complete(&[ChatMessage::user(prompt)]).await?;

        let mut reply = if entering {
            self.store.clear_history(chat_id, session.epoch).await;
            let intro = self.content.load_message("random").await;
            let text = if intro.is_empty() {
                fact
            } else {
                format!("{intro}\n\n{fact}")
            };
            Reply::text(text).with_image(self.content.load_image("random").await)
        } else {
            Reply::text(fact)
        };
        reply = reply.with_buttons(vec![
            (BTN_MORE.to_string(), LBL_MORE_FACT.to_string()),
            end_button(),
        ]);
        Ok(Outcome::new(reply, DialogueState::Random, Some(Mode::Random)))
    }

    // ------------------------------------------------------------------
    // Open Q&A mode
    // ------------------------------------------------------------------

    /// Seeds the system prompt and fetches the opening reply.
    async fn enter_gpt(&self, chat_id: ChatId, session: &Session) -> Result<Outcome> {
        let prompt = self.content.load_prompt("gpt").await;
        let intro = self.content.load_message("gpt").await;
        let opening = self
            .complete(&[ChatMessage::system(&prompt), ChatMessage::user(&intro)])
            .await?;

        self.store.clear_history(chat_id, session.epoch).await;
        self.store
            .append_message(chat_id, session.epoch, ChatMessage::system(prompt))
            .await;
        self.store
            .append_message(chat_id, session.epoch, ChatMessage::assistant(&opening))
            .await;

        let reply = Reply::text(opening)
            .with_image(self.content.load_image("gpt").await)
            .with_buttons(vec![end_button()]);
        Ok(Outcome::new(reply, DialogueState::Gpt, Some(Mode::Gpt)))
    }

    /// One free-text round: append to history, query, reply.
    ///
    /// History grows by exactly two messages (user, assistant) per
    /// successful round and by zero on a failed completion call.
    async fn chat_turn(
        &self,
        chat_id: ChatId,
        session: &Session,
        text: &str,
        buttons: Vec<(String, String)>,
        next: DialogueState,
    ) -> Result<Outcome> {
        if text.trim().is_empty() {
            return Ok(Outcome::silent(session));
        }

        let mut messages = session.history.clone();
        messages.push(ChatMessage::user(text));
        let answer = self.complete(&messages).await?;

        self.store
            .append_message(chat_id, session.epoch, ChatMessage::user(text))
            .await;
        self.store
            .append_message(chat_id, session.epoch, ChatMessage::assistant(&answer))
            .await;

        Ok(Outcome::new(
            Reply::text(answer).with_buttons(buttons),
            next,
            session.mode,
        ))
    }

    // ------------------------------------------------------------------
    // Persona talk mode
    // ------------------------------------------------------------------

    /// Shows the persona list.
    async fn persona_list(&self) -> Outcome {
        let text = or_fallback(self.content.load_message("talk").await, TEXT_TALK_FALLBACK);
        let mut buttons: Vec<(String, String)> = Persona::iter()
            .map(|p| (p.token().to_string(), p.label().to_string()))
            .collect();
        buttons.push(end_button());
        let reply = Reply::text(text)
            .with_image(self.content.load_image("talk").await)
            .with_buttons(buttons);
        Outcome::new(reply, DialogueState::TalkChoice, Some(Mode::Talk))
    }

    /// Seeds the persona system prompt and fetches its greeting.
    async fn select_persona(
        &self,
        chat_id: ChatId,
        session: &Session,
        persona: Persona,
    ) -> Result<Outcome> {
        let prompt = self.content.load_prompt(persona.token()).await;
        let opening = self.complete(&[ChatMessage::system(&prompt)]).await?;

        self.store.clear_history(chat_id, session.epoch).await;
        self.store
            .append_message(chat_id, session.epoch, ChatMessage::system(prompt))
            .await;
        self.store
            .append_message(chat_id, session.epoch, ChatMessage::assistant(&opening))
            .await;

        let reply = Reply::text(format!("Ви обрали {}: {}", persona.label(), opening))
            .with_image(self.content.load_image(persona.token()).await)
            .with_buttons(talk_buttons());
        Ok(Outcome::new(reply, DialogueState::TalkChat, Some(Mode::Talk)))
    }

    // ------------------------------------------------------------------
    // Quiz mode
    // ------------------------------------------------------------------

    /// Shows the theme list.
    async fn theme_list(&self) -> Outcome {
        let text = or_fallback(self.content.load_message("quiz").await, TEXT_QUIZ_FALLBACK);
        let mut buttons: Vec<(String, String)> = QuizTheme::iter()
            .map(|t| (t.token().to_string(), t.label().to_string()))
            .collect();
        buttons.push(end_button());
        let reply = Reply::text(text)
            .with_image(self.content.load_image("quiz").await)
            .with_buttons(buttons);
        Outcome::new(reply, DialogueState::QuizTheme, Some(Mode::Quiz))
    }

    /// Generates a question the chat has not seen for this theme, derives
    /// its accepted answers, and poses it.
    async fn pose_question(
        &self,
        chat_id: ChatId,
        session: &Session,
        theme: QuizTheme,
    ) -> Result<Outcome> {
        let system_prompt = self.content.load_prompt("quiz").await;
        let mut request = format!("Згенеруй нове питання з теми \"{}\".", theme.prompt_topic());

        let mut question = String::new();
        for attempt in 1..=MAX_QUESTION_ATTEMPTS {
            let candidate = self
                .complete(&[
                    ChatMessage::system(&system_prompt),
                    ChatMessage::user(&request),
                ])
                .await?;
            question = candidate.trim().to_string();
            if !self.store.was_question_asked(chat_id, theme, &question).await {
                break;
            }
            if attempt == MAX_QUESTION_ATTEMPTS {
                tracing::warn!(
                    chat_id,
                    ?theme,
                    attempts = MAX_QUESTION_ATTEMPTS,
                    "accepting a possibly duplicate quiz question"
                );
                break;
            }
            tracing::debug!(chat_id, ?theme, attempt, "duplicate quiz question, retrying");
            request = format!(
                "Згенеруй інше нове питання з теми \"{}\", яке ще не ставилося.",
                theme.prompt_topic()
            );
        }

        let answers_prompt = self.content.load_prompt("quiz_answers").await;
        let raw_answers = self
            .complete(&[
                ChatMessage::system(&answers_prompt),
                ChatMessage::user(format!("Питання: {question}")),
            ])
            .await?;
        let accepted = parse_accepted_answers(&raw_answers);
        if accepted.is_empty() {
            tracing::warn!(chat_id, ?theme, "no accepted answers derived for question");
        }

        self.store
            .set_quiz_theme(chat_id, session.epoch, theme)
            .await;
        self.store
            .record_question(chat_id, session.epoch, theme, &question)
            .await;
        self.store
            .set_accepted_answers(chat_id, session.epoch, accepted)
            .await;

        Ok(Outcome::new(
            Reply::text(question),
            DialogueState::QuizAnswer,
            Some(Mode::Quiz),
        ))
    }

    /// Matches a short free-text answer against the accepted set.
    async fn check_answer(
        &self,
        chat_id: ChatId,
        session: &Session,
        text: &str,
    ) -> Result<Outcome> {
        if text.trim().is_empty() {
            return Ok(Outcome::silent(session));
        }
        if text.split_whitespace().count() > MAX_ANSWER_WORDS {
            // Rejected locally, no upstream call.
            return Ok(Outcome::stay(session, Reply::text(TEXT_ANSWER_TOO_LONG)));
        }

        let accepted = &session.quiz.accepted_answers;
        let verdict = if quiz::is_correct(text, accepted) {
            let count = self.store.increment_correct(chat_id).await;
            format!("Правильно! Рахунок: {count}")
        } else {
            let count = self.store.correct_count(chat_id).await;
            format!(
                "Неправильно. Правильна відповідь: {}. Рахунок: {count}",
                accepted.join(", ")
            )
        };

        let buttons = vec![
            (BTN_MORE.to_string(), LBL_MORE_QUESTION.to_string()),
            (BTN_CHANGE_THEME.to_string(), LBL_CHANGE_THEME.to_string()),
            end_button(),
        ];
        Ok(Outcome::new(
            Reply::text(verdict).with_buttons(buttons),
            DialogueState::QuizTheme,
            Some(Mode::Quiz),
        ))
    }

    // ------------------------------------------------------------------
    // Translation mode
    // ------------------------------------------------------------------

    /// Shows the target-language list.
    async fn language_list(&self) -> Outcome {
        let text = or_fallback(
            self.content.load_message("translate").await,
            TEXT_TRANSLATE_FALLBACK,
        );
        let mut buttons: Vec<(String, String)> = Language::iter()
            .map(|l| (l.token().to_string(), l.label().to_string()))
            .collect();
        buttons.push(end_button());
        let reply = Reply::text(text)
            .with_image(self.content.load_image("translate").await)
            .with_buttons(buttons);
        Outcome::new(reply, DialogueState::TranslateChoice, Some(Mode::Translate))
    }

    /// Stores the target language and asks for text.
    async fn select_language(
        &self,
        chat_id: ChatId,
        session: &Session,
        language: Language,
    ) -> Result<Outcome> {
        self.store
            .set_translate_target(chat_id, session.epoch, language)
            .await;
        let text = format!(
            "Мова перекладу: {}. Надішліть текст для перекладу.",
            language.label()
        );
        Ok(Outcome::new(
            Reply::text(text),
            DialogueState::TranslateInput,
            Some(Mode::Translate),
        ))
    }

    /// Translates free text into the stored target language and returns the
    /// result with source/target/original metadata lines.
    async fn translate_text(&self, session: &Session, text: &str) -> Result<Outcome> {
        if text.trim().is_empty() {
            return Ok(Outcome::silent(session));
        }
        let Some(target) = session.translate.target else {
            // Should be unreachable through the FSM; re-show the list.
            return Ok(self.language_list().await);
        };

        let prompt = self.content.load_prompt("translate").await;
        let request = format!("Переклади цей текст мовою {}:\n{}", target.label(), text);
        let translation = self
            .complete(&[ChatMessage::system(prompt), ChatMessage::user(request)])
            .await?;

        let reply_text = format!(
            "{translation}\n\nМова оригіналу: авто\nМова перекладу: {}\nОригінал: {}",
            target.label(),
            text
        );
        let mut buttons: Vec<(String, String)> = Language::iter()
            .map(|l| (l.token().to_string(), l.label().to_string()))
            .collect();
        buttons.push(end_button());
        Ok(Outcome::new(
            Reply::text(reply_text).with_buttons(buttons),
            DialogueState::TranslateChoice,
            Some(Mode::Translate),
        ))
    }

    // ------------------------------------------------------------------
    // Voice-chat mode
    // ------------------------------------------------------------------

    /// Seeds the voice-chat system prompt and asks for a voice message.
    async fn enter_voice(&self, chat_id: ChatId, session: &Session) -> Result<Outcome> {
        self.store.clear_history(chat_id, session.epoch).await;
        let prompt = self.content.load_prompt("voice").await;
        if !prompt.is_empty() {
            self.store
                .append_message(chat_id, session.epoch, ChatMessage::system(prompt))
                .await;
        }
        let text = self.content.load_message("voice").await;
        let reply = Reply::text(text)
            .with_image(self.content.load_image("voice").await)
            .with_buttons(vec![end_button()]);
        Ok(Outcome::new(reply, DialogueState::VoiceChat, Some(Mode::Voice)))
    }

    /// One voice round: transcribe, query, synthesize.
    async fn voice_turn(
        &self,
        chat_id: ChatId,
        session: &Session,
        audio: crate::service::AudioBlob,
    ) -> Result<Outcome> {
        let transcript = self.voice.transcribe(&audio, VOICE_LANGUAGE_HINT).await?;
        let text = match transcript {
            Transcript::Text(text) => text,
            Transcript::NoSpeech => {
                return Ok(Outcome::stay(session, Reply::text(TEXT_NO_SPEECH)));
            }
        };

        let mut messages = session.history.clone();
        messages.push(ChatMessage::user(&text));
        let answer = self.complete(&messages).await?;
        let spoken = self.voice.synthesize(&answer, VOICE_LANGUAGE_HINT).await?;

        self.store
            .append_message(chat_id, session.epoch, ChatMessage::user(text))
            .await;
        self.store
            .append_message(chat_id, session.epoch, ChatMessage::assistant(&answer))
            .await;

        let reply = Reply::text(answer)
            .with_voice(spoken)
            .with_buttons(vec![end_button()]);
        Ok(Outcome::new(reply, DialogueState::VoiceChat, Some(Mode::Voice)))
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    /// Calls the completion service under the defensive timeout.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        match tokio::time::timeout(COMPLETION_TIMEOUT, self.completion.complete(messages)).await {
            Ok(result) => result,
            Err(_) => Err(RozmovaError::completion(
                "час очікування відповіді вичерпано",
            )),
        }
    }

    /// Delivers a reply: image first (failures are soft), then voice, then
    /// text with buttons.
    async fn deliver(&self, chat_id: ChatId, reply: &Reply) -> Result<()> {
        if let Some(image) = &reply.image {
            if let Err(err) = self.gateway.send_image(chat_id, image).await {
                tracing::warn!(chat_id, error = %err, "image delivery failed");
            }
        }
        if let Some(voice) = &reply.voice {
            self.gateway.send_voice(chat_id, voice).await?;
        }
        if !reply.text.is_empty() {
            if reply.buttons.is_empty() {
                self.gateway.send_text(chat_id, &reply.text).await?;
            } else {
                self.gateway
                    .send_buttons(chat_id, &reply.text, &reply.buttons)
                    .await?;
            }
        }
        Ok(())
    }
}

/// Substitutes the fallback when a content-store text is missing, keeping
/// menu replies non-empty so their buttons are always delivered.
fn or_fallback(text: String, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

fn end_button() -> (String, String) {
    (BTN_END.to_string(), LBL_END.to_string())
}

fn talk_buttons() -> Vec<(String, String)> {
    vec![
        end_button(),
        (
            BTN_SWITCH_PERSONA.to_string(),
            LBL_SWITCH_PERSONA.to_string(),
        ),
    ]
}

/// Parses the model's comma-separated accepted-answer list: lowercased,
/// trimmed, entries longer than two words dropped.
fn parse_accepted_answers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(quiz::normalize)
        .filter(|answer| {
            !answer.is_empty() && answer.split_whitespace().count() <= MAX_ANSWER_WORDS
        })
        .collect()
}

//! Dialogue state machine types.

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

/// The per-chat finite-state machine state.
///
/// One terminal state (`Ended`), the rest transient/cyclic. A new or reset
/// session always starts in `Main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    /// Top-level menu, waiting for a mode selection.
    #[default]
    Main,
    /// Random-fact mode, waiting for "more" or "end".
    Random,
    /// Open Q&A mode, waiting for free text.
    Gpt,
    /// Persona list shown, waiting for a persona selection.
    TalkChoice,
    /// Persona conversation, waiting for free text.
    TalkChat,
    /// Theme list shown, waiting for a theme selection or "more".
    QuizTheme,
    /// Question posed, waiting for a short free-text answer.
    QuizAnswer,
    /// Language list shown, waiting for a language selection.
    TranslateChoice,
    /// Target language stored, waiting for text to translate.
    TranslateInput,
    /// Voice conversation, waiting for a voice message.
    VoiceChat,
    /// Dialogue terminated by the top-level cancel command.
    Ended,
}

/// Top-level conversational mode, redundant with [`DialogueState`] but used
/// for free-text routing and the mode re-entry guard. Kept consistent with
/// the state by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Random,
    Gpt,
    Talk,
    Quiz,
    Translate,
    Voice,
}

impl Mode {
    /// Display name shown on the main-menu button.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Random => "Дізнатися випадковий цікавий факт 🧠",
            Mode::Gpt => "Задати питання чату GPT 🤖",
            Mode::Talk => "Поговорити з відомою особистістю 👤",
            Mode::Quiz => "Взяти участь у квізі ❓",
            Mode::Translate => "Перекласти текст 🌍",
            Mode::Voice => "Поспілкуватися голосом 🎤",
        }
    }

    /// Button/command token selecting this mode from the main menu.
    pub fn token(&self) -> &'static str {
        match self {
            Mode::Random => "random",
            Mode::Gpt => "gpt",
            Mode::Talk => "talk",
            Mode::Quiz => "quiz",
            Mode::Translate => "translater",
            Mode::Voice => "voicechat",
        }
    }

    /// Resolves a main-menu token back to a mode.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "random" => Some(Mode::Random),
            "gpt" => Some(Mode::Gpt),
            "talk" => Some(Mode::Talk),
            "quiz" => Some(Mode::Quiz),
            "translater" => Some(Mode::Translate),
            "voicechat" => Some(Mode::Voice),
            _ => None,
        }
    }
}

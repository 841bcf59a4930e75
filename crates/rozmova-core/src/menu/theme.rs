//! Quiz theme catalog.

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

/// A quiz topic the user can pick before answering questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum QuizTheme {
    Programming,
    Math,
    Biology,
}

impl QuizTheme {
    /// Button callback token.
    pub fn token(&self) -> &'static str {
        match self {
            QuizTheme::Programming => "quiz_prog",
            QuizTheme::Math => "quiz_math",
            QuizTheme::Biology => "quiz_bio",
        }
    }

    /// Display name shown on the theme button.
    pub fn label(&self) -> &'static str {
        match self {
            QuizTheme::Programming => "Програмування",
            QuizTheme::Math => "Математика",
            QuizTheme::Biology => "Біологія",
        }
    }

    /// Theme name embedded into question-generation prompts.
    pub fn prompt_topic(&self) -> &'static str {
        match self {
            QuizTheme::Programming => "програмування мовою Python",
            QuizTheme::Math => "математика",
            QuizTheme::Biology => "біологія",
        }
    }

    /// Resolves a button token back to a theme.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "quiz_prog" => Some(QuizTheme::Programming),
            "quiz_math" => Some(QuizTheme::Math),
            "quiz_bio" => Some(QuizTheme::Biology),
            _ => None,
        }
    }
}

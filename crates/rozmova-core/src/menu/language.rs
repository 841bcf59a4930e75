//! Target language catalog for the translation mode.

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

/// A translation target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum Language {
    En,
    Uk,
    Cs,
    Es,
    Fr,
}

impl Language {
    /// Button callback token.
    pub fn token(&self) -> &'static str {
        match self {
            Language::En => "to_en",
            Language::Uk => "to_uk",
            Language::Cs => "to_cs",
            Language::Es => "to_es",
            Language::Fr => "to_fr",
        }
    }

    /// Display name, also embedded into the translation prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Language::En => "Англійська",
            Language::Uk => "Українська",
            Language::Cs => "Чеська",
            Language::Es => "Іспанська",
            Language::Fr => "Французька",
        }
    }

    /// Resolves a button token back to a language.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "to_en" => Some(Language::En),
            "to_uk" => Some(Language::Uk),
            "to_cs" => Some(Language::Cs),
            "to_es" => Some(Language::Es),
            "to_fr" => Some(Language::Fr),
            _ => None,
        }
    }
}

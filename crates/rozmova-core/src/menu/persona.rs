//! Persona catalog for the talk mode.
//!
//! Each persona is a fixed character identity whose system prompt is loaded
//! from the content store under the persona's prompt key.

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

/// A famous personality the user can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum Persona {
    Cobain,
    Hawking,
    Nietzsche,
    Queen,
    Tolkien,
}

impl Persona {
    /// Button callback token, also used as the content-store prompt key.
    pub fn token(&self) -> &'static str {
        match self {
            Persona::Cobain => "talk_cobain",
            Persona::Hawking => "talk_hawking",
            Persona::Nietzsche => "talk_nietzsche",
            Persona::Queen => "talk_queen",
            Persona::Tolkien => "talk_tolkien",
        }
    }

    /// Display name shown on the persona button.
    pub fn label(&self) -> &'static str {
        match self {
            Persona::Cobain => "Курт Кобейн",
            Persona::Hawking => "Стівен Хокінг",
            Persona::Nietzsche => "Фрідріх Ніцше",
            Persona::Queen => "Єлизавета II",
            Persona::Tolkien => "Джон Толкін",
        }
    }

    /// Resolves a button token back to a persona.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "talk_cobain" => Some(Persona::Cobain),
            "talk_hawking" => Some(Persona::Hawking),
            "talk_nietzsche" => Some(Persona::Nietzsche),
            "talk_queen" => Some(Persona::Queen),
            "talk_tolkien" => Some(Persona::Tolkien),
            _ => None,
        }
    }
}

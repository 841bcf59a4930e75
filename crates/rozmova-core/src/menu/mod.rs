//! Static menu catalogs.
//!
//! Personas, quiz themes and target languages are tagged enumerations mapped
//! to display text and content-store keys, replacing string-keyed ad hoc
//! dictionaries. Button lists are built by iterating the enums.

mod language;
mod persona;
mod theme;

pub use language::Language;
pub use persona::Persona;
pub use theme::QuizTheme;

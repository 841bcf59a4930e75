//! Quiz answer-matching module.

pub mod matcher;

pub use matcher::{is_correct, normalize};

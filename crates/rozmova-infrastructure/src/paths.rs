//! Well-known filesystem locations.

use rozmova_core::{Result, RozmovaError};
use std::path::PathBuf;

/// Path helpers for the application's configuration directory.
pub struct RozmovaPaths;

impl RozmovaPaths {
    /// Returns the configuration directory: `~/.config/rozmova`.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("rozmova"))
            .ok_or_else(|| RozmovaError::config("could not determine config directory"))
    }

    /// Returns the secret file path: `~/.config/rozmova/secret.json`.
    pub fn secret_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("secret.json"))
    }
}

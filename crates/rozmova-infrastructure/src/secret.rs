//! Secret configuration file storage.
//!
//! Provides read-only loading of provider credentials from
//! `~/.config/rozmova/secret.json`.
//!
//! # Security Note
//!
//! The secret file is plaintext JSON; it should carry restrictive file
//! permissions (e.g. 600).

use crate::paths::RozmovaPaths;
use rozmova_core::{Result, RozmovaError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// OpenAI credentials and model override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSecret {
    /// API key for the OpenAI endpoints.
    pub api_key: String,
    /// Chat model override; the client default applies when absent.
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Telegram bot credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSecret {
    /// Bot token issued by BotFather.
    pub bot_token: String,
}

/// Provider credentials stored in `secret.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    /// OpenAI configuration.
    #[serde(default)]
    pub openai: Option<OpenAiSecret>,
    /// Telegram configuration.
    #[serde(default)]
    pub telegram: Option<TelegramSecret>,
}

/// Storage for the secret configuration file.
///
/// Responsibilities:
/// - Load secret.json from the configuration directory
/// - Parse JSON into [`SecretConfig`]
///
/// Does NOT:
/// - Write or modify secret files (read-only)
/// - Validate API keys or credentials
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Creates a storage over the default path
    /// (`~/.config/rozmova/secret.json`).
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: RozmovaPaths::secret_file()?,
        })
    }

    /// Creates a storage over a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads and parses the secret configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file is missing, unreadable or
    /// not valid JSON.
    pub fn load(&self) -> Result<SecretConfig> {
        if !self.path.exists() {
            return Err(RozmovaError::config(format!(
                "secret file not found at {}",
                self.path.display()
            )));
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|err| RozmovaError::config(format!("failed to read secret file: {err}")))?;
        serde_json::from_str(&content)
            .map_err(|err| RozmovaError::config(format!("failed to parse secret file: {err}")))
    }

    /// Returns the path this storage reads from.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

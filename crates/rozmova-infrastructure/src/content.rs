//! Filesystem-backed content store.
//!
//! Loads user-facing texts, system prompts and mode images from a resource
//! directory:
//!
//! ```text
//! resources/
//!   messages/{key}.txt
//!   prompts/{key}.txt
//!   images/{key}.jpg
//! ```
//!
//! Missing texts degrade to an empty string rather than an error, so a bot
//! with an incomplete resource set keeps running with terser replies.

use async_trait::async_trait;
use rozmova_core::service::{ContentStore, ImageRef};
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png"];

/// Content store reading from a local resource directory.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Creates a store rooted at the given resource directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn load_text(&self, subdir: &str, key: &str) -> String {
        let path = self.root.join(subdir).join(format!("{key}.txt"));
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => text.trim_end().to_string(),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "text resource missing");
                String::new()
            }
        }
    }

    /// The resource root this store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn load_message(&self, key: &str) -> String {
        self.load_text("messages", key).await
    }

    async fn load_prompt(&self, key: &str) -> String {
        self.load_text("prompts", key).await
    }

    async fn load_image(&self, key: &str) -> Option<ImageRef> {
        for ext in IMAGE_EXTENSIONS {
            let path = self.root.join("images").join(format!("{key}.{ext}"));
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some(ImageRef(path));
            }
        }
        None
    }
}

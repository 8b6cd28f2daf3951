//! Snapshot storage trait and implementations

use crate::error::Result;
use crate::repair;
use crate::structs::{Settings, Theme};
use async_trait::async_trait;
use chat_core::{Conversation, Folder, ModelDescriptor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Fixed keys of the durable key-value mirror.
pub mod keys {
    pub const CONVERSATION_HISTORY: &str = "conversationHistory";
    pub const SELECTED_CONVERSATION: &str = "selectedConversation";
    pub const FOLDERS: &str = "folders";
    pub const API_KEY: &str = "apiKey";
    pub const THEME: &str = "theme";
    pub const SHOW_CHATBAR: &str = "showChatbar";
    pub const SHOW_PROMPTBAR: &str = "showPromptbar";
}

/// String-keyed durable store holding one serialized value per key.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Read the raw value under a key, `None` when absent.
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Write the raw value under a key.
    async fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// File-based snapshot storage: one `<key>.json` file per key.
#[derive(Clone)]
pub struct FileSnapshotStorage {
    base_path: PathBuf,
}

impl FileSnapshotStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

#[async_trait]
impl SnapshotStorage for FileSnapshotStorage {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);

        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).await?;
        Ok(Some(contents))
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;

        let path = self.key_path(key);
        fs::write(&path, value).await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);

        if path.exists() {
            fs::remove_file(&path).await?;
        }

        Ok(())
    }
}

/// Typed persistence layer over the fixed keys.
///
/// Loads never fail outward: a missing or malformed value is "absent" and
/// yields the caller's default after the repair pass. Saves return their
/// result so the store can decide the failure policy.
pub struct Persistence<S: SnapshotStorage> {
    storage: Arc<S>,
}

impl<S: SnapshotStorage> Persistence<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    async fn read_json(&self, key: &str) -> Option<serde_json::Value> {
        let raw = match self.storage.read(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(key, error = %err, "snapshot read failed, treating as absent");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "malformed snapshot, treating as absent");
                None
            }
        }
    }

    async fn read_raw(&self, key: &str) -> Option<String> {
        match self.storage.read(key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, error = %err, "snapshot read failed, treating as absent");
                None
            }
        }
    }

    pub async fn load_history(
        &self,
        default_model: &ModelDescriptor,
        default_prompt: &str,
    ) -> Vec<Conversation> {
        match self.read_json(keys::CONVERSATION_HISTORY).await {
            Some(value) => repair::repair_history(&value, default_model, default_prompt),
            None => Vec::new(),
        }
    }

    pub async fn save_history(&self, conversations: &[Conversation]) -> Result<()> {
        let raw = serde_json::to_string(conversations)?;
        self.storage.write(keys::CONVERSATION_HISTORY, &raw).await
    }

    pub async fn clear_history(&self) -> Result<()> {
        self.storage.remove(keys::CONVERSATION_HISTORY).await
    }

    pub async fn load_selected(
        &self,
        default_model: &ModelDescriptor,
        default_prompt: &str,
    ) -> Option<Conversation> {
        let value = self.read_json(keys::SELECTED_CONVERSATION).await?;
        repair::repair_conversation(&value, default_model, default_prompt)
    }

    pub async fn save_selected(&self, conversation: &Conversation) -> Result<()> {
        let raw = serde_json::to_string(conversation)?;
        self.storage.write(keys::SELECTED_CONVERSATION, &raw).await
    }

    pub async fn clear_selected(&self) -> Result<()> {
        self.storage.remove(keys::SELECTED_CONVERSATION).await
    }

    pub async fn load_folders(&self) -> Vec<Folder> {
        match self.read_json(keys::FOLDERS).await {
            Some(value) => repair::repair_folders(&value),
            None => Vec::new(),
        }
    }

    pub async fn save_folders(&self, folders: &[Folder]) -> Result<()> {
        let raw = serde_json::to_string(folders)?;
        self.storage.write(keys::FOLDERS, &raw).await
    }

    /// Load the scalar settings, falling back to defaults field by field.
    pub async fn load_settings(&self) -> Settings {
        let mut settings = Settings::default();

        if let Some(key) = self.read_raw(keys::API_KEY).await {
            settings.api_key = key;
        }
        if let Some(theme) = self
            .read_raw(keys::THEME)
            .await
            .as_deref()
            .and_then(Theme::parse)
        {
            settings.theme = theme;
        }
        if let Some(raw) = self.read_raw(keys::SHOW_CHATBAR).await {
            settings.show_chatbar = raw == "true";
        }
        if let Some(raw) = self.read_raw(keys::SHOW_PROMPTBAR).await {
            settings.show_promptbar = raw == "true";
        }

        settings
    }

    pub async fn save_api_key(&self, api_key: &str) -> Result<()> {
        self.storage.write(keys::API_KEY, api_key).await
    }

    pub async fn save_theme(&self, theme: Theme) -> Result<()> {
        self.storage.write(keys::THEME, theme.as_str()).await
    }

    pub async fn save_show_chatbar(&self, visible: bool) -> Result<()> {
        let raw = if visible { "true" } else { "false" };
        self.storage.write(keys::SHOW_CHATBAR, raw).await
    }

    pub async fn save_show_promptbar(&self, visible: bool) -> Result<()> {
        let raw = if visible { "true" } else { "false" };
        self.storage.write(keys::SHOW_PROMPTBAR, raw).await
    }
}

//! Conversation store service

use crate::error::{Result, StoreError};
use crate::folders::FolderRegistry;
use crate::repair::FALLBACK_CONVERSATION_NAME;
use crate::storage::{Persistence, SnapshotStorage};
use crate::structs::{ConversationPatch, Settings, Theme};
use chat_core::{Conversation, Folder, FolderKind, Message, ModelDescriptor};
use std::sync::Arc;
use tokio::sync::RwLock;

struct StoreState {
    conversations: Vec<Conversation>,
    selected_id: String,
    folders: FolderRegistry,
    settings: Settings,
    streaming: bool,
}

/// Canonical mutable collection of conversations plus the single
/// active-conversation pointer.
///
/// The pointer is held as an id and resolved against the canonical list, so
/// no call path can make the two disagree. The durable mirror lags behind:
/// every mutation persists afterwards, and a failed write is logged and
/// swallowed — in-memory state stays authoritative.
pub struct ConversationStore<S: SnapshotStorage> {
    persistence: Persistence<S>,
    state: Arc<RwLock<StoreState>>,
    default_model: ModelDescriptor,
    default_prompt: String,
}

impl<S: SnapshotStorage> ConversationStore<S> {
    /// Load the store from storage, running the repair pass over the
    /// persisted history, folders and active pointer.
    ///
    /// When the pointer record is absent or unrecoverable, a fresh default
    /// conversation is created and selected; it is not persisted until the
    /// first write that touches it.
    pub async fn new(
        storage: S,
        default_model: ModelDescriptor,
        default_prompt: impl Into<String>,
    ) -> Self {
        let persistence = Persistence::new(Arc::new(storage));
        let default_prompt = default_prompt.into();

        let mut conversations = persistence
            .load_history(&default_model, &default_prompt)
            .await;
        let folders = FolderRegistry::from_folders(persistence.load_folders().await);
        let settings = persistence.load_settings().await;

        let selected_id = match persistence
            .load_selected(&default_model, &default_prompt)
            .await
        {
            Some(selected) => match conversations.iter().find(|c| c.id == selected.id) {
                // The list copy is canonical
                Some(existing) => existing.id.clone(),
                None => {
                    let id = selected.id.clone();
                    conversations.push(selected);
                    id
                }
            },
            None => {
                let fresh = Conversation::new(
                    FALLBACK_CONVERSATION_NAME,
                    default_model.clone(),
                    &default_prompt,
                );
                let id = fresh.id.clone();
                conversations.push(fresh);
                id
            }
        };

        Self {
            persistence,
            state: Arc::new(RwLock::new(StoreState {
                conversations,
                selected_id,
                folders,
                settings,
                streaming: false,
            })),
            default_model,
            default_prompt,
        }
    }

    // ============================================================================
    // Read access
    // ============================================================================

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.state.read().await.conversations.clone()
    }

    pub async fn selected_id(&self) -> String {
        self.state.read().await.selected_id.clone()
    }

    /// The active conversation, resolved against the canonical list.
    pub async fn selected(&self) -> Option<Conversation> {
        let state = self.state.read().await;
        state
            .conversations
            .iter()
            .find(|c| c.id == state.selected_id)
            .cloned()
    }

    pub async fn folders(&self) -> Vec<Folder> {
        self.state.read().await.folders.as_slice().to_vec()
    }

    pub async fn is_streaming(&self) -> bool {
        self.state.read().await.streaming
    }

    // ============================================================================
    // Conversation lifecycle
    // ============================================================================

    /// Create a fresh conversation, append it and make it active.
    pub async fn create_conversation(&self) -> Conversation {
        let (conversation, history) = {
            let mut state = self.state.write().await;
            let name = format!("Conversation {}", state.conversations.len() + 1);
            let conversation =
                Conversation::new(name, self.default_model.clone(), &self.default_prompt);
            state.conversations.push(conversation.clone());
            state.selected_id = conversation.id.clone();
            (conversation, state.conversations.clone())
        };

        self.persist_history_snapshot(&history).await;
        self.persist_selected_snapshot(&conversation).await;
        conversation
    }

    /// Make the conversation with this id active. A no-op when the id is
    /// absent; callers are expected to have validated it.
    pub async fn select_conversation(&self, id: &str) {
        let selected = {
            let mut state = self.state.write().await;
            match state.conversations.iter().find(|c| c.id == id).cloned() {
                Some(conversation) => {
                    state.selected_id = conversation.id.clone();
                    Some(conversation)
                }
                None => None,
            }
        };

        match selected {
            Some(conversation) => self.persist_selected_snapshot(&conversation).await,
            None => tracing::warn!(id, "select ignored, conversation not in canonical list"),
        }
    }

    /// Apply a single-field patch. The canonical list is the one place the
    /// update lands; the active pointer resolves against it afterwards.
    pub async fn apply_patch(&self, id: &str, patch: ConversationPatch) -> Result<Conversation> {
        let (snapshot, history, is_selected) = {
            let mut state = self.state.write().await;
            let conversation = state
                .conversations
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))?;

            match patch {
                ConversationPatch::Name(name) => conversation.name = name,
                ConversationPatch::Model(model) => conversation.model = model,
                ConversationPatch::SystemPrompt(prompt) => conversation.prompt = prompt,
                ConversationPatch::Folder(folder_id) => conversation.folder_id = folder_id,
            }

            let snapshot = conversation.clone();
            let is_selected = state.selected_id == id;
            (snapshot, state.conversations.clone(), is_selected)
        };

        self.persist_history_snapshot(&history).await;
        if is_selected {
            self.persist_selected_snapshot(&snapshot).await;
        }
        Ok(snapshot)
    }

    /// Append a message, optionally truncating the tail first (edit and
    /// regenerate drop every message at or after the given index).
    pub async fn append_message(
        &self,
        id: &str,
        message: Message,
        truncate_from: Option<usize>,
    ) -> Result<()> {
        let (snapshot, history, is_selected) = {
            let mut state = self.state.write().await;
            let conversation = state
                .conversations
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))?;

            if let Some(index) = truncate_from {
                conversation.messages.truncate(index);
            }
            conversation.messages.push(message);

            let snapshot = conversation.clone();
            let is_selected = state.selected_id == id;
            (snapshot, state.conversations.clone(), is_selected)
        };

        self.persist_history_snapshot(&history).await;
        if is_selected {
            self.persist_selected_snapshot(&snapshot).await;
        }
        Ok(())
    }

    /// Remove a conversation. When the active one is deleted, the most
    /// recent remaining conversation becomes active; when none remain, a
    /// fresh conversation is created and the persisted pointer key is
    /// removed so the next load re-derives it.
    pub async fn delete_conversation(&self, id: &str) -> Result<()> {
        enum Reselect {
            Unchanged,
            Existing(Conversation),
            Fresh,
        }

        let (history, reselect) = {
            let mut state = self.state.write().await;
            if !state.conversations.iter().any(|c| c.id == id) {
                return Err(StoreError::ConversationNotFound(id.to_string()));
            }
            state.conversations.retain(|c| c.id != id);
            let history = state.conversations.clone();

            let reselect = if state.selected_id != id {
                Reselect::Unchanged
            } else if let Some(last) = state.conversations.last().cloned() {
                state.selected_id = last.id.clone();
                Reselect::Existing(last)
            } else {
                let fresh = Conversation::new(
                    FALLBACK_CONVERSATION_NAME,
                    self.default_model.clone(),
                    &self.default_prompt,
                );
                state.selected_id = fresh.id.clone();
                state.conversations.push(fresh);
                Reselect::Fresh
            };
            (history, reselect)
        };

        self.persist_history_snapshot(&history).await;
        match reselect {
            Reselect::Unchanged => {}
            Reselect::Existing(conversation) => {
                self.persist_selected_snapshot(&conversation).await;
            }
            Reselect::Fresh => {
                if let Err(err) = self.persistence.clear_selected().await {
                    tracing::warn!(error = %err, "failed to clear persisted active pointer");
                }
            }
        }
        Ok(())
    }

    /// Empty the canonical list and remove chat-type folders, leaving one
    /// fresh active conversation. Prompt-type folders are untouched.
    pub async fn clear_all(&self) {
        let folders = {
            let mut state = self.state.write().await;
            let fresh = Conversation::new(
                FALLBACK_CONVERSATION_NAME,
                self.default_model.clone(),
                &self.default_prompt,
            );
            state.selected_id = fresh.id.clone();
            state.conversations = vec![fresh];
            state.folders.remove_kind(FolderKind::Chat);
            state.folders.as_slice().to_vec()
        };

        if let Err(err) = self.persistence.clear_history().await {
            tracing::warn!(error = %err, "failed to clear persisted history");
        }
        if let Err(err) = self.persistence.clear_selected().await {
            tracing::warn!(error = %err, "failed to clear persisted active pointer");
        }
        self.persist_folders_snapshot(&folders).await;
    }

    // ============================================================================
    // Streaming merge
    // ============================================================================

    /// Merge the accumulated streamed text into the conversation.
    ///
    /// The first chunk appends a new assistant message; every later chunk
    /// replaces the last message's content with the full accumulated text.
    /// Replaying the same `(text, is_first = false)` pair is a no-op, and
    /// nothing is persisted here — writes happen once at stream completion.
    pub async fn append_streamed_chunk(
        &self,
        id: &str,
        accumulated_text: &str,
        is_first_chunk: bool,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))?;

        match conversation.messages.last_mut() {
            Some(last) if !is_first_chunk => last.content = accumulated_text.to_string(),
            _ => conversation
                .messages
                .push(Message::assistant(accumulated_text)),
        }
        Ok(())
    }

    /// Claim the streaming slot. Returns false when a stream is already in
    /// progress; only one conversation may stream at a time.
    pub async fn try_begin_streaming(&self) -> bool {
        let mut state = self.state.write().await;
        if state.streaming {
            false
        } else {
            state.streaming = true;
            true
        }
    }

    pub async fn end_streaming(&self) {
        self.state.write().await.streaming = false;
    }

    /// Snapshot the canonical list, and the pointer when the conversation is
    /// active. Called once when a stream completes or is aborted.
    pub async fn persist_conversation(&self, id: &str) -> Result<()> {
        let (snapshot, history, is_selected) = {
            let state = self.state.read().await;
            let conversation = state
                .conversations
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))?;
            let is_selected = state.selected_id == id;
            (conversation, state.conversations.clone(), is_selected)
        };

        self.persist_history_snapshot(&history).await;
        if is_selected {
            self.persist_selected_snapshot(&snapshot).await;
        }
        Ok(())
    }

    // ============================================================================
    // Folders
    // ============================================================================

    pub async fn create_folder(&self, name: impl Into<String>, kind: FolderKind) -> Folder {
        let (folder, folders) = {
            let mut state = self.state.write().await;
            let folder = state.folders.create(name, kind);
            (folder, state.folders.as_slice().to_vec())
        };

        self.persist_folders_snapshot(&folders).await;
        folder
    }

    pub async fn rename_folder(&self, id: &str, name: impl Into<String>) -> Result<()> {
        let folders = {
            let mut state = self.state.write().await;
            if !state.folders.rename(id, name) {
                return Err(StoreError::FolderNotFound(id.to_string()));
            }
            state.folders.as_slice().to_vec()
        };

        self.persist_folders_snapshot(&folders).await;
        Ok(())
    }

    /// Delete a folder and orphan its members: every conversation pointing
    /// at it is patched to `folder_id = None`. Never deletes conversations.
    pub async fn delete_folder(&self, id: &str) -> Result<()> {
        let (folders, history) = {
            let mut state = self.state.write().await;
            if !state.folders.remove(id) {
                return Err(StoreError::FolderNotFound(id.to_string()));
            }
            for conversation in &mut state.conversations {
                if conversation.folder_id.as_deref() == Some(id) {
                    conversation.folder_id = None;
                }
            }
            (
                state.folders.as_slice().to_vec(),
                state.conversations.clone(),
            )
        };

        self.persist_folders_snapshot(&folders).await;
        self.persist_history_snapshot(&history).await;
        Ok(())
    }

    // ============================================================================
    // Settings
    // ============================================================================

    pub async fn api_key(&self) -> String {
        self.state.read().await.settings.api_key.clone()
    }

    pub async fn set_api_key(&self, api_key: impl Into<String>) {
        let api_key = api_key.into();
        self.state.write().await.settings.api_key = api_key.clone();
        if let Err(err) = self.persistence.save_api_key(&api_key).await {
            tracing::warn!(error = %err, "api key write failed");
        }
    }

    pub async fn theme(&self) -> Theme {
        self.state.read().await.settings.theme
    }

    pub async fn set_theme(&self, theme: Theme) {
        self.state.write().await.settings.theme = theme;
        if let Err(err) = self.persistence.save_theme(theme).await {
            tracing::warn!(error = %err, "theme write failed");
        }
    }

    pub async fn show_chatbar(&self) -> bool {
        self.state.read().await.settings.show_chatbar
    }

    pub async fn set_show_chatbar(&self, visible: bool) {
        self.state.write().await.settings.show_chatbar = visible;
        if let Err(err) = self.persistence.save_show_chatbar(visible).await {
            tracing::warn!(error = %err, "chatbar visibility write failed");
        }
    }

    pub async fn show_promptbar(&self) -> bool {
        self.state.read().await.settings.show_promptbar
    }

    pub async fn set_show_promptbar(&self, visible: bool) {
        self.state.write().await.settings.show_promptbar = visible;
        if let Err(err) = self.persistence.save_show_promptbar(visible).await {
            tracing::warn!(error = %err, "promptbar visibility write failed");
        }
    }

    // ============================================================================
    // Persistence policy
    // ============================================================================

    async fn persist_history_snapshot(&self, conversations: &[Conversation]) {
        if let Err(err) = self.persistence.save_history(conversations).await {
            tracing::warn!(error = %err, "history write failed, in-memory state kept");
        }
    }

    async fn persist_selected_snapshot(&self, conversation: &Conversation) {
        if let Err(err) = self.persistence.save_selected(conversation).await {
            tracing::warn!(error = %err, "active pointer write failed, in-memory state kept");
        }
    }

    async fn persist_folders_snapshot(&self, folders: &[Folder]) {
        if let Err(err) = self.persistence.save_folders(folders).await {
            tracing::warn!(error = %err, "folder list write failed, in-memory state kept");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileSnapshotStorage;
    use chat_core::DEFAULT_SYSTEM_PROMPT;
    use tempfile::tempdir;

    async fn store_in(dir: &std::path::Path) -> ConversationStore<FileSnapshotStorage> {
        ConversationStore::new(
            FileSnapshotStorage::new(dir),
            ModelDescriptor::fallback(),
            DEFAULT_SYSTEM_PROMPT,
        )
        .await
    }

    #[tokio::test]
    async fn test_new_store_has_one_fresh_conversation() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let conversations = store.conversations().await;
        assert_eq!(conversations.len(), 1);
        assert!(conversations[0].messages.is_empty());
        assert_eq!(store.selected().await.unwrap().id, conversations[0].id);
    }

    #[tokio::test]
    async fn test_create_conversation_selects_it() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let created = store.create_conversation().await;
        assert_eq!(store.selected().await.unwrap().id, created.id);
        assert_eq!(store.conversations().await.len(), 2);
    }

    #[tokio::test]
    async fn test_select_unknown_id_is_noop() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let before = store.selected_id().await;

        store.select_conversation("no-such-id").await;

        assert_eq!(store.selected_id().await, before);
    }

    #[tokio::test]
    async fn test_patch_keeps_list_and_pointer_in_agreement() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let id = store.selected_id().await;

        store
            .apply_patch(&id, ConversationPatch::Name("Renamed".to_string()))
            .await
            .unwrap();
        store
            .apply_patch(&id, ConversationPatch::SystemPrompt("be terse".to_string()))
            .await
            .unwrap();

        let selected = store.selected().await.unwrap();
        let in_list = store
            .conversations()
            .await
            .into_iter()
            .find(|c| c.id == id)
            .unwrap();
        assert_eq!(selected, in_list);
        assert_eq!(selected.name, "Renamed");
        assert_eq!(selected.prompt, "be terse");
    }

    #[tokio::test]
    async fn test_patch_unknown_id_fails() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let result = store
            .apply_patch("ghost", ConversationPatch::Name("x".to_string()))
            .await;
        assert!(matches!(result, Err(StoreError::ConversationNotFound(_))));
    }

    #[tokio::test]
    async fn test_append_message_truncates_tail() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let id = store.selected_id().await;

        store
            .append_message(&id, Message::user("one"), None)
            .await
            .unwrap();
        store
            .append_message(&id, Message::assistant("two"), None)
            .await
            .unwrap();
        store
            .append_message(&id, Message::user("three"), None)
            .await
            .unwrap();

        // Edit message index 1: everything from there is dropped first
        store
            .append_message(&id, Message::user("edited"), Some(1))
            .await
            .unwrap();

        let messages = store.selected().await.unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "one");
        assert_eq!(messages[1].content, "edited");
    }

    #[tokio::test]
    async fn test_delete_reassigns_active_to_last() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let first = store.selected_id().await;
        let second = store.create_conversation().await;
        let third = store.create_conversation().await;

        store.delete_conversation(&third.id).await.unwrap();

        assert_eq!(store.selected_id().await, second.id);
        store.delete_conversation(&first).await.unwrap();
        assert_eq!(store.selected_id().await, second.id);
    }

    #[tokio::test]
    async fn test_delete_last_leaves_exactly_one() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let only = store.selected_id().await;

        store.delete_conversation(&only).await.unwrap();

        let conversations = store.conversations().await;
        assert_eq!(conversations.len(), 1);
        assert_ne!(conversations[0].id, only);
        assert_eq!(store.selected_id().await, conversations[0].id);
    }

    #[tokio::test]
    async fn test_streamed_chunk_appends_then_overwrites() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let id = store.selected_id().await;

        store
            .append_message(&id, Message::user("Hello"), None)
            .await
            .unwrap();
        store.append_streamed_chunk(&id, "Hi", true).await.unwrap();

        let messages = store.selected().await.unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Message::assistant("Hi"));

        store
            .append_streamed_chunk(&id, "Hi there", false)
            .await
            .unwrap();
        let messages = store.selected().await.unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Hi there");
    }

    #[tokio::test]
    async fn test_streamed_chunk_replay_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let id = store.selected_id().await;

        store
            .append_message(&id, Message::user("Hello"), None)
            .await
            .unwrap();
        store.append_streamed_chunk(&id, "Hi", true).await.unwrap();
        store
            .append_streamed_chunk(&id, "Hi there", false)
            .await
            .unwrap();
        store
            .append_streamed_chunk(&id, "Hi there", false)
            .await
            .unwrap();

        let messages = store.selected().await.unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Hi there");
    }

    #[tokio::test]
    async fn test_streaming_flag_guards_second_claim() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        assert!(store.try_begin_streaming().await);
        assert!(!store.try_begin_streaming().await);

        store.end_streaming().await;
        assert!(store.try_begin_streaming().await);
    }

    #[tokio::test]
    async fn test_clear_all_keeps_prompt_folders() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;
        store.create_folder("Chats", FolderKind::Chat).await;
        let prompts = store.create_folder("Prompts", FolderKind::Prompt).await;
        store.create_conversation().await;

        store.clear_all().await;

        let conversations = store.conversations().await;
        assert_eq!(conversations.len(), 1);
        assert!(conversations[0].messages.is_empty());

        let folders = store.folders().await;
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].id, prompts.id);
    }

    #[tokio::test]
    async fn test_delete_folder_orphans_without_deleting() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let folder = store.create_folder("Work", FolderKind::Chat).await;
        let id = store.selected_id().await;
        store
            .apply_patch(&id, ConversationPatch::Folder(Some(folder.id.clone())))
            .await
            .unwrap();
        let count_before = store.conversations().await.len();

        store.delete_folder(&folder.id).await.unwrap();

        let conversations = store.conversations().await;
        assert_eq!(conversations.len(), count_before);
        assert!(conversations.iter().all(|c| c.folder_id.is_none()));
        assert!(store.folders().await.is_empty());
    }

    #[tokio::test]
    async fn test_settings_persist_immediately() {
        let dir = tempdir().unwrap();
        {
            let store = store_in(dir.path()).await;
            store.set_api_key("sk-test").await;
            store.set_theme(Theme::Light).await;
            store.set_show_promptbar(false).await;
        }

        let store = store_in(dir.path()).await;
        assert_eq!(store.api_key().await, "sk-test");
        assert_eq!(store.theme().await, Theme::Light);
        assert!(!store.show_promptbar().await);
    }
}

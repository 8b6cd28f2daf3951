//! # Conversation Manager
//!
//! Canonical state for conversational sessions: the conversation list, the
//! single active-conversation pointer, folder grouping, and the durable
//! key-value mirror with its load-time repair pass.
//!
//! The [`ConversationStore`] is the single source of truth; every other
//! component reads from it and mutates through it.

pub mod error;
pub mod folders;
pub mod manager;
pub mod repair;
pub mod storage;
pub mod structs;

// Re-exports
pub use error::StoreError;
pub use folders::FolderRegistry;
pub use manager::ConversationStore;
pub use storage::{keys, FileSnapshotStorage, Persistence, SnapshotStorage};
pub use structs::{ConversationPatch, Settings, Theme};

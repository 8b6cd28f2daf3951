//! Conversation store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// An operation addressed a conversation id absent from the canonical
    /// list. A programming-contract violation, not a user-facing failure.
    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("folder not found: {0}")]
    FolderNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

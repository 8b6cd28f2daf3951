//! chat_core - Core types for the conversation system
//!
//! This crate provides the foundational types used across all conversation
//! crates:
//! - `message` - role-tagged chat messages
//! - `conversation` - a named, ordered exchange of messages
//! - `folder` - flat grouping records for conversations and prompts
//! - `model` - descriptors for remote completion models

pub mod conversation;
pub mod folder;
pub mod message;
pub mod model;

// Re-export commonly used types
pub use conversation::{Conversation, DEFAULT_SYSTEM_PROMPT};
pub use folder::{Folder, FolderKind};
pub use message::{Message, Role};
pub use model::ModelDescriptor;

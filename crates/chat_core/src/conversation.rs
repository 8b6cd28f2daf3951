//! A named, ordered exchange of messages.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;
use crate::model::ModelDescriptor;

/// System prompt applied to conversations that carry none of their own.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are ChatGPT, a large language model trained by OpenAI. Follow the user's instructions carefully. Respond using markdown.";

/// A conversation: ordered messages plus model, prompt and grouping metadata.
///
/// Serialized camelCase (`folderId`) so records written by earlier versions
/// of the on-disk snapshot load unchanged.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub name: String,
    pub messages: Vec<Message>,
    pub model: ModelDescriptor,
    pub prompt: String,
    pub folder_id: Option<String>,
}

impl Conversation {
    /// Create an empty conversation with a fresh id.
    pub fn new(name: impl Into<String>, model: ModelDescriptor, prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            messages: Vec::new(),
            model,
            prompt: prompt.into(),
            folder_id: None,
        }
    }
}

//! Flat grouping records for conversations and prompts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a folder may contain.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FolderKind {
    Chat,
    Prompt,
}

/// A named group. Conversations reference folders by id; deleting a folder
/// orphans its members rather than deleting them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FolderKind,
}

impl Folder {
    pub fn new(name: impl Into<String>, kind: FolderKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
        }
    }
}

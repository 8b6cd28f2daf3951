//! Store data structures

use chat_core::ModelDescriptor;
use serde::{Deserialize, Serialize};

/// UI theme
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parse a persisted theme string. Anything unrecognized is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Dark
    }
}

/// Small scalar settings mirrored under their own storage keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: String,
    pub theme: Theme,
    pub show_chatbar: bool,
    pub show_promptbar: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            theme: Theme::default(),
            show_chatbar: true,
            show_promptbar: true,
        }
    }
}

/// A single-field update to a conversation.
///
/// A closed set of variants instead of an open field/value pair, so every
/// caller goes through the same typed merge path.
#[derive(Debug, Clone)]
pub enum ConversationPatch {
    Name(String),
    Model(ModelDescriptor),
    SystemPrompt(String),
    Folder(Option<String>),
}

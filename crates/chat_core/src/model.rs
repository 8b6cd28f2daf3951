//! Descriptors for remote completion models.

use serde::{Deserialize, Serialize};

/// A completion model as reported by the model-listing endpoint.
///
/// Immutable once fetched. Serialized camelCase so persisted conversations
/// keep the wire shape of the listing response.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub max_length: u32,
    pub token_limit: u32,
}

impl ModelDescriptor {
    /// The model assumed when a persisted record carries none.
    pub fn fallback() -> Self {
        Self {
            id: "gpt-3.5-turbo".to_string(),
            name: "GPT-3.5".to_string(),
            max_length: 12000,
            token_limit: 4000,
        }
    }
}

//! Load-time repair of persisted records.
//!
//! Legacy and hand-edited snapshots show up with missing or mistyped fields.
//! The pass normalizes what it can and drops what it cannot, so a load never
//! fails outright. It is idempotent: repairing already-clean data returns it
//! unchanged.

use chat_core::{Conversation, Folder, Message, ModelDescriptor};
use serde_json::Value;

/// Name given to conversations whose stored record carries none.
pub const FALLBACK_CONVERSATION_NAME: &str = "New Conversation";

/// Repair a persisted conversation list. Non-array input yields an empty
/// list; entries without a usable id are dropped (inventing one would make
/// the pass non-idempotent).
pub fn repair_history(
    value: &Value,
    default_model: &ModelDescriptor,
    default_prompt: &str,
) -> Vec<Conversation> {
    let Some(entries) = value.as_array() else {
        tracing::warn!("persisted conversation history is not an array, discarding");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| repair_conversation(entry, default_model, default_prompt))
        .collect()
}

/// Repair a single persisted conversation record. Returns `None` when the
/// record is unrecoverable (not an object, or no string id).
pub fn repair_conversation(
    value: &Value,
    default_model: &ModelDescriptor,
    default_prompt: &str,
) -> Option<Conversation> {
    let record = value.as_object()?;

    let id = record
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())?
        .to_string();

    let name = record
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(FALLBACK_CONVERSATION_NAME)
        .to_string();

    let messages = record
        .get("messages")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|m| serde_json::from_value::<Message>(m.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    let model = record
        .get("model")
        .and_then(|m| serde_json::from_value::<ModelDescriptor>(m.clone()).ok())
        .unwrap_or_else(|| default_model.clone());

    let prompt = record
        .get("prompt")
        .and_then(Value::as_str)
        .unwrap_or(default_prompt)
        .to_string();

    let folder_id = record
        .get("folderId")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(Conversation {
        id,
        name,
        messages,
        model,
        prompt,
        folder_id,
    })
}

/// Repair a persisted folder list. Entries that do not deserialize are
/// dropped; non-array input yields an empty list.
pub fn repair_folders(value: &Value) -> Vec<Folder> {
    let Some(entries) = value.as_array() else {
        tracing::warn!("persisted folder list is not an array, discarding");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| serde_json::from_value::<Folder>(entry.clone()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> (ModelDescriptor, String) {
        (ModelDescriptor::fallback(), "default prompt".to_string())
    }

    #[test]
    fn test_missing_messages_becomes_empty_list() {
        let (model, prompt) = defaults();
        let stored = json!({
            "id": "c-1",
            "name": "Kept",
            "model": model,
            "prompt": "custom",
            "folderId": null
        });

        let repaired = repair_conversation(&stored, &model, &prompt).unwrap();
        assert_eq!(repaired.messages, vec![]);
        assert_eq!(repaired.name, "Kept");
        assert_eq!(repaired.prompt, "custom");
    }

    #[test]
    fn test_missing_model_gets_default() {
        let (model, prompt) = defaults();
        let stored = json!({ "id": "c-1", "name": "X", "messages": [] });

        let repaired = repair_conversation(&stored, &model, &prompt).unwrap();
        assert_eq!(repaired.model, model);
        assert_eq!(repaired.prompt, prompt);
    }

    #[test]
    fn test_entry_without_id_is_dropped() {
        let (model, prompt) = defaults();
        let stored = json!([
            { "name": "no id" },
            { "id": "c-2", "name": "ok" },
            "not even an object"
        ]);

        let repaired = repair_history(&stored, &model, &prompt);
        assert_eq!(repaired.len(), 1);
        assert_eq!(repaired[0].id, "c-2");
    }

    #[test]
    fn test_malformed_messages_are_dropped() {
        let (model, prompt) = defaults();
        let stored = json!({
            "id": "c-1",
            "messages": [
                { "role": "user", "content": "hello" },
                { "role": "alien", "content": "zap" },
                42
            ]
        });

        let repaired = repair_conversation(&stored, &model, &prompt).unwrap();
        assert_eq!(repaired.messages.len(), 1);
        assert_eq!(repaired.messages[0].content, "hello");
    }

    #[test]
    fn test_repair_is_idempotent() {
        let (model, prompt) = defaults();
        let stored = json!([
            { "id": "c-1", "name": "A" },
            { "id": "c-2", "messages": [{ "role": "user", "content": "hi" }] },
            { "no": "id" }
        ]);

        let once = repair_history(&stored, &model, &prompt);
        let serialized = serde_json::to_value(&once).unwrap();
        let twice = repair_history(&serialized, &model, &prompt);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_array_history_is_discarded() {
        let (model, prompt) = defaults();
        assert!(repair_history(&json!({"oops": true}), &model, &prompt).is_empty());
    }

    #[test]
    fn test_folder_repair_drops_bad_entries() {
        let stored = json!([
            { "id": "f-1", "name": "Work", "type": "chat" },
            { "id": "f-2", "name": "Bad", "type": "garage" },
            17
        ]);

        let repaired = repair_folders(&stored);
        assert_eq!(repaired.len(), 1);
        assert_eq!(repaired[0].id, "f-1");
    }
}

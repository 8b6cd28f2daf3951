//! Wire types of the completion service endpoints.

use chat_core::{Message, ModelDescriptor};
use serde::{Deserialize, Serialize};

/// JSON body of the completion request. The response is a raw byte stream;
/// its fully concatenated decoded text is the assistant's reply.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CompletionRequest {
    pub model: ModelDescriptor,
    pub messages: Vec<Message>,
    pub key: String,
    pub prompt: String,
}

/// JSON body of the model-listing request.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModelsRequest {
    pub key: String,
}

/// Error envelope carried by model-listing failure responses, when present.
#[derive(Deserialize, Debug)]
pub(crate) struct ErrorEnvelope {
    pub error: Option<ErrorDetail>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

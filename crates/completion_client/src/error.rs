use conversation_manager::StoreError;
use std::fmt;
use thiserror::Error;

/// Structured error extracted from a model-listing failure response, shaped
/// for display: an optional service error code plus message lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub code: Option<String>,
    pub message_lines: Vec<String>,
}

impl ApiErrorBody {
    /// The generic body used when the failure response carries nothing
    /// parseable.
    pub fn fallback() -> Self {
        Self {
            code: None,
            message_lines: vec![
                "Make sure your API key is set in the sidebar settings.".to_string(),
                "If you completed this step, the completion service may be experiencing issues."
                    .to_string(),
            ],
        }
    }
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = &self.code {
            write!(f, "[{}] ", code)?;
        }
        write!(f, "{}", self.message_lines.join(" "))
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    /// A second send was attempted while a response stream was in progress.
    #[error("a response stream is already in progress")]
    StreamInProgress,

    /// Non-success status or transport failure on the completion request.
    /// Terminal for this attempt; retrying is the user's call.
    #[error("completion request failed: {0}")]
    RequestFailed(String),

    /// The response byte stream failed mid-read.
    #[error("response stream failed: {0}")]
    Stream(String),

    /// Non-success or unparsable response on the model-listing request.
    #[error("model listing failed: {0}")]
    ModelFetchFailed(ApiErrorBody),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

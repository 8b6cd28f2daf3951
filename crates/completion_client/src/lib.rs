//! # Completion Client
//!
//! HTTP access to the remote completion service, incremental decoding of the
//! streamed reply, and the send orchestration state machine that merges each
//! chunk into the conversation store.

pub mod api;
pub mod client_trait;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod stream;

// Re-exports
pub use api::client::CompletionClient;
pub use api::models::{CompletionRequest, ModelsRequest};
pub use client_trait::{ByteStream, CompletionBackend};
pub use config::ClientConfig;
pub use error::{ApiErrorBody, ClientError};
pub use orchestrator::{RequestOrchestrator, SendOutcome, SendPhase};
pub use stream::StreamDecoder;

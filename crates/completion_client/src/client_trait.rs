use crate::api::models::CompletionRequest;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chat_core::ModelDescriptor;
use futures_util::stream::BoxStream;

/// The raw response body of a completion request. Chunk boundaries are
/// transport-level only and carry no semantic meaning.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Seam between the orchestrator and the HTTP layer, so the send flow can be
/// driven against stub streams in tests.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Issue the completion request. Success hands back the response byte
    /// stream; a non-success status is already a `RequestFailed` here.
    async fn send_completion(&self, request: &CompletionRequest) -> Result<ByteStream>;

    /// Fetch the model listing for the given api key.
    async fn fetch_models(&self, key: &str) -> Result<Vec<ModelDescriptor>>;
}

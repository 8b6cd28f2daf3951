//! Send orchestration: builds the outgoing request, drives the response
//! stream, and merges each chunk into the conversation store.

use std::sync::Arc;

use chat_core::{Message, ModelDescriptor};
use conversation_manager::{ConversationPatch, ConversationStore, SnapshotStorage, StoreError};
use futures_util::StreamExt;
use log::{info, warn};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::api::models::CompletionRequest;
use crate::client_trait::CompletionBackend;
use crate::error::{ClientError, Result};
use crate::stream::StreamDecoder;

/// Leading characters of the first user message used for the auto-derived
/// conversation name.
const AUTO_NAME_MAX_CHARS: usize = 30;

/// Lifecycle of a send attempt. Terminal phases return to `Idle` once the
/// attempt has been wound down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPhase {
    Idle,
    Sending,
    Streaming,
    Completed,
    Aborted,
    Failed,
}

/// How a finished stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Completed,
    Aborted,
}

/// Owns the in-flight send: one request at a time, cooperative cancellation
/// observed at the chunk suspension point, no retries ever.
pub struct RequestOrchestrator<S: SnapshotStorage, C: CompletionBackend> {
    store: Arc<ConversationStore<S>>,
    backend: Arc<C>,
    phase: Mutex<SendPhase>,
    cancel: Mutex<CancellationToken>,
}

impl<S: SnapshotStorage, C: CompletionBackend> RequestOrchestrator<S, C> {
    pub fn new(store: Arc<ConversationStore<S>>, backend: Arc<C>) -> Self {
        Self {
            store,
            backend,
            phase: Mutex::new(SendPhase::Idle),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub async fn phase(&self) -> SendPhase {
        *self.phase.lock().await
    }

    async fn set_phase(&self, phase: SendPhase) {
        *self.phase.lock().await = phase;
    }

    /// Request cancellation of the in-flight stream. Observed at the next
    /// chunk boundary, so at most one more chunk may still be merged.
    pub async fn stop(&self) {
        self.cancel.lock().await.cancel();
    }

    /// Send a user message to the active conversation and stream the reply.
    pub async fn send(&self, message: Message) -> Result<SendOutcome> {
        self.dispatch(message, None).await
    }

    /// Edit/regenerate: drop every message of the active conversation at or
    /// after `truncate_from`, then send exactly like a normal message.
    pub async fn resend(&self, message: Message, truncate_from: usize) -> Result<SendOutcome> {
        self.dispatch(message, Some(truncate_from)).await
    }

    /// Fetch the model listing with the stored api key.
    pub async fn fetch_models(&self) -> Result<Vec<ModelDescriptor>> {
        let key = self.store.api_key().await;
        self.backend.fetch_models(&key).await
    }

    async fn dispatch(
        &self,
        message: Message,
        truncate_from: Option<usize>,
    ) -> Result<SendOutcome> {
        // Reject, not queue: a second send while streaming is a caller error
        if !self.store.try_begin_streaming().await {
            warn!("send rejected, a response stream is already in progress");
            return Err(ClientError::StreamInProgress);
        }

        let cancel = {
            let mut guard = self.cancel.lock().await;
            *guard = CancellationToken::new();
            guard.clone()
        };

        let result = self.run_send(message, truncate_from, cancel).await;

        self.store.end_streaming().await;
        self.set_phase(SendPhase::Idle).await;
        result
    }

    async fn run_send(
        &self,
        message: Message,
        truncate_from: Option<usize>,
        cancel: CancellationToken,
    ) -> Result<SendOutcome> {
        self.set_phase(SendPhase::Sending).await;

        let id = match self.store.selected().await {
            Some(conversation) => conversation.id,
            None => {
                return Err(ClientError::Store(StoreError::ConversationNotFound(
                    "active".to_string(),
                )))
            }
        };

        self.store
            .append_message(&id, message, truncate_from)
            .await?;

        // Re-read after the append so the payload carries the full tail
        let conversation = self
            .store
            .selected()
            .await
            .ok_or_else(|| StoreError::ConversationNotFound(id.clone()))?;
        let request = CompletionRequest {
            model: conversation.model.clone(),
            messages: conversation.messages.clone(),
            key: self.store.api_key().await,
            prompt: conversation.prompt.clone(),
        };

        let mut stream = match self.backend.send_completion(&request).await {
            Ok(stream) => stream,
            Err(err) => {
                self.set_phase(SendPhase::Failed).await;
                return Err(err);
            }
        };

        self.set_phase(SendPhase::Streaming).await;

        let mut decoder = StreamDecoder::new();
        let mut is_first_chunk = true;
        let outcome = loop {
            // Cancellation wins over an already-buffered chunk, so at most
            // the chunk in flight when stop() lands is merged
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => break SendOutcome::Aborted,
                chunk = stream.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    let total = decoder.push(&bytes).to_string();
                    if is_first_chunk {
                        is_first_chunk = false;
                        // First exchange: name the conversation after the
                        // opening user message
                        if request.messages.len() == 1 {
                            let name = derive_name(&request.messages[0].content);
                            self.store
                                .apply_patch(&id, ConversationPatch::Name(name))
                                .await?;
                        }
                        self.store.append_streamed_chunk(&id, &total, true).await?;
                    } else {
                        self.store.append_streamed_chunk(&id, &total, false).await?;
                    }
                }
                Some(Err(err)) => {
                    self.set_phase(SendPhase::Failed).await;
                    return Err(err);
                }
                None => break SendOutcome::Completed,
            }
        };

        // Whatever was merged stays, aborted or not; one write at the end
        self.store.persist_conversation(&id).await?;
        self.set_phase(match outcome {
            SendOutcome::Completed => SendPhase::Completed,
            SendOutcome::Aborted => SendPhase::Aborted,
        })
        .await;

        info!("stream finished: {:?}", outcome);
        Ok(outcome)
    }
}

fn derive_name(content: &str) -> String {
    let leading: String = content.chars().take(AUTO_NAME_MAX_CHARS).collect();
    if content.chars().count() > AUTO_NAME_MAX_CHARS {
        format!("{}...", leading)
    } else {
        leading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_name_short_content_unchanged() {
        assert_eq!(derive_name("Hello"), "Hello");
    }

    #[test]
    fn test_derive_name_truncates_with_marker() {
        let content = "a".repeat(45);
        let name = derive_name(&content);
        assert_eq!(name, format!("{}...", "a".repeat(30)));
    }

    #[test]
    fn test_derive_name_counts_chars_not_bytes() {
        let content = "é".repeat(30);
        assert_eq!(derive_name(&content), content);
    }
}

use async_trait::async_trait;
use chat_core::ModelDescriptor;
use futures_util::StreamExt;
use log::{error, info};
use reqwest::Client;

use crate::api::models::{CompletionRequest, ErrorEnvelope, ModelsRequest};
use crate::client_trait::{ByteStream, CompletionBackend};
use crate::config::ClientConfig;
use crate::error::{ApiErrorBody, ClientError, Result};

/// HTTP client for the completion service.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: Client,
    config: ClientConfig,
}

impl CompletionClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn send_completion(&self, request: &CompletionRequest) -> Result<ByteStream> {
        info!(
            "sending completion request with {} messages",
            request.messages.len()
        );

        let response = self
            .client
            .post(self.config.chat_url())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("failed to send completion request: {}", e);
                ClientError::RequestFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("completion request failed: {} with status {}", body, status);
            return Err(ClientError::RequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let stream = response
            .bytes_stream()
            .map(|item| item.map_err(|e| ClientError::Stream(e.to_string())))
            .boxed();
        Ok(stream)
    }

    async fn fetch_models(&self, key: &str) -> Result<Vec<ModelDescriptor>> {
        info!("fetching available models");

        let response = self
            .client
            .post(self.config.models_url())
            .json(&ModelsRequest {
                key: key.to_string(),
            })
            .send()
            .await
            .map_err(|e| {
                error!("failed to send models request: {}", e);
                ClientError::ModelFetchFailed(ApiErrorBody::fallback())
            })?;

        let status = response.status();
        if !status.is_success() {
            // Surface the service's own error body when it has one
            let body = match response.json::<ErrorEnvelope>().await {
                Ok(ErrorEnvelope { error: Some(detail) }) => ApiErrorBody {
                    code: detail.code,
                    message_lines: detail
                        .message
                        .map(|m| vec![m])
                        .unwrap_or_else(|| ApiErrorBody::fallback().message_lines),
                },
                _ => ApiErrorBody::fallback(),
            };
            error!("models request failed with status {}: {}", status, body);
            return Err(ClientError::ModelFetchFailed(body));
        }

        response.json::<Vec<ModelDescriptor>>().await.map_err(|e| {
            error!("failed to parse models response: {}", e);
            ClientError::ModelFetchFailed(ApiErrorBody::fallback())
        })
    }
}

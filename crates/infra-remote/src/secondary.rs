// Secondary translation stage adapter (JSON-RPC 2.0)

use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::core::ClientError;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::Deserialize;
use tracing::debug;
use transflow_core::port::{SecondaryTranslationStage, StageError, StageErrorCode};

#[derive(Deserialize)]
struct RetranslateResponse {
    text: String,
}

/// Calls `{method}` with the named param `text` and expects `{"text": ...}` back.
/// Error codes from the service are preserved in [`StageError::Rejected`].
pub struct RpcSecondaryTranslator {
    client: HttpClient,
    method: String,
}

impl RpcSecondaryTranslator {
    pub fn new(url: &str, method: impl Into<String>) -> Result<Self, StageError> {
        let client = HttpClientBuilder::default()
            .build(url)
            .map_err(|e| StageError::Transport(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            method: method.into(),
        })
    }
}

fn map_client_error(err: ClientError) -> StageError {
    match err {
        ClientError::Call(call_err) => StageError::Rejected {
            code: StageErrorCode::from_code(call_err.code()),
            message: call_err.message().to_string(),
        },
        ClientError::ParseError(e) => StageError::InvalidResponse(e.to_string()),
        ClientError::Transport(e) => StageError::Transport(e.to_string()),
        other => StageError::Transport(other.to_string()),
    }
}

#[async_trait]
impl SecondaryTranslationStage for RpcSecondaryTranslator {
    async fn retranslate(&self, text: &str) -> Result<String, StageError> {
        let mut params = ObjectParams::new();
        params
            .insert("text", text)
            .map_err(|e| StageError::Transport(format!("failed to encode params: {}", e)))?;

        let response: RetranslateResponse = self
            .client
            .request(&self.method, params)
            .await
            .map_err(map_client_error)?;

        debug!(method = %self.method, chars = response.text.chars().count(), "Secondary stage replied");
        Ok(response.text)
    }
}

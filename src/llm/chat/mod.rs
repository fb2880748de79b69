pub mod gemini;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use self::gemini::GeminiChatClient;
use super::LlmConfig;

#[derive(Debug, Error)]
pub enum RemoteCallError {
    #[error("API call failed: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("API call failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Send a prompt to the remote endpoint and return the generated text.
    /// When `structured_json` is set, the endpoint is asked to constrain its
    /// output to syntactically valid JSON.
    async fn ask(
        &self,
        prompt: &str,
        structured_json: bool
    ) -> Result<String, RemoteCallError>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn QueryClient>, RemoteCallError> {
    let client = GeminiChatClient::from_config(config)?;
    Ok(Arc::new(client))
}

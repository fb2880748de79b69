use async_trait::async_trait;
use log::info;
use serde::{ Deserialize, Serialize };
use std::time::Duration;

use super::{ QueryClient, RemoteCallError };
use crate::llm::LlmConfig;

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize, Default)]
struct GoogleCandidate {
    #[serde(default)]
    content: GoogleContent,
}

#[derive(Deserialize, Default)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize, Default)]
struct GooglePart {
    #[serde(default)]
    text: String,
}

pub struct GeminiChatClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        request_timeout: Duration
    ) -> Result<Self, RemoteCallError> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { http, api_key, model, base_url })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, RemoteCallError> {
        Self::new(
            config.api_key.clone(),
            config.completion_model.clone(),
            config.base_url.clone(),
            config.request_timeout
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl QueryClient for GeminiChatClient {
    async fn ask(
        &self,
        prompt: &str,
        structured_json: bool
    ) -> Result<String, RemoteCallError> {
        let payload = GenerateRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: structured_json.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };

        info!(
            "GeminiChatClient::ask() → model={} structured_json={}",
            self.model,
            structured_json
        );

        let resp = self.http
            .post(self.endpoint())
            .header("X-goog-api-key", &self.api_key)
            .json(&payload)
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteCallError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // A response without the candidates path yields empty text, not an error.
        let parsed: GenerateResponse = resp.json().await?;
        let text = parsed.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();
        Ok(text)
    }
}

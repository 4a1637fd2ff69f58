use super::{ModerationTransport, RawResponse};
use crate::error::ModerationError;
use async_trait::async_trait;
use serde::Serialize;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/moderations";
pub const DEFAULT_MODEL: &str = "omni-moderation-latest";

#[derive(Debug, Serialize)]
struct ModerationRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// OpenAI moderation endpoint over reqwest
///
/// Endpoint and credential are injected at construction; timeouts are the
/// reqwest client defaults.
#[derive(Clone)]
pub struct OpenAiTransport {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiTransport {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ModerationTransport for OpenAiTransport {
    async fn send(&self, input: &str) -> Result<RawResponse, ModerationError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ModerationRequest {
                model: &self.model,
                input,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ModerationError::Unreachable(e.to_string())
                } else {
                    ModerationError::Transport(e)
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}

//! HTTP-backed [`ReplyOracle`] talking to a text-completion endpoint.
//!
//! The endpoint contract is a single POST of `{"prompt": ..., "stop": ...,
//! "temperature": ...}` answered with `{"text": "..."}`. Anything the
//! operator points `CONFAB_ORACLE_URL` at that speaks this shape works.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use confab_store::Message;

use crate::error::{OracleError, Result};
use crate::prompt;
use crate::ReplyOracle;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    text: String,
}

/// Client for a remote completion endpoint.
pub struct HttpOracle {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpOracle {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await?;
        if !resp.status().is_success() {
            return Err(OracleError::BadResponse(format!(
                "endpoint answered {}",
                resp.status()
            )));
        }

        let completion: CompletionResponse = resp.json().await?;
        debug!(chars = completion.text.len(), "Completion received");
        Ok(completion.text)
    }
}

#[async_trait]
impl ReplyOracle for HttpOracle {
    async fn suggest(&self, history: &[Message], draft: &str) -> Result<String> {
        let built = prompt::suggest_prompt(history, draft);
        let raw = self
            .complete(&CompletionRequest {
                prompt: &built,
                stop: None,
                temperature: None,
            })
            .await?;
        Ok(prompt::clean_suggestion(&raw))
    }

    async fn roleplay_reply(&self, history: &[Message], contact_name: &str) -> Result<String> {
        let built = prompt::roleplay_prompt(history, contact_name);
        // Stop at newlines to keep replies text-message sized.
        let raw = self
            .complete(&CompletionRequest {
                prompt: &built,
                stop: Some(vec!["\n"]),
                temperature: Some(0.8),
            })
            .await?;
        Ok(raw.trim().to_string())
    }
}

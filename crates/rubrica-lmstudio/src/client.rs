//! Chat-completion client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use rubrica_core::{ChatMessage, Error, GradingError, GradingProvider, Result};

use crate::config::LmStudioConfig;

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint
pub struct ChatCompletionClient {
    config: LmStudioConfig,
    endpoint: Url,
    client: Client,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    stream: bool,
}

impl ChatCompletionClient {
    /// Create a new client from configuration
    pub fn new(config: LmStudioConfig) -> Result<Self> {
        config.validate()?;
        let endpoint = config.endpoint()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("could not build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            endpoint,
            client,
        })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = LmStudioConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &LmStudioConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn describe(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!(
                "request to {} timed out after {}s",
                self.endpoint,
                self.config.timeout.as_secs_f64()
            )
        } else if err.is_connect() {
            format!(
                "could not reach {} (is the model server running?): {}",
                self.endpoint, err
            )
        } else {
            format!("request to {} failed: {}", self.endpoint, err)
        }
    }
}

/// Pull `choices[0].message.content` out of a response envelope
pub fn extract_content(envelope: &Value) -> std::result::Result<String, GradingError> {
    let choice = envelope
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .ok_or_else(|| {
            GradingError::UnexpectedResponseShape("response has no choices".to_string())
        })?;

    choice
        .pointer("/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            GradingError::UnexpectedResponseShape(
                "first choice has no message content".to_string(),
            )
        })
}

#[async_trait]
impl GradingProvider for ChatCompletionClient {
    async fn complete(&self, messages: &[ChatMessage]) -> std::result::Result<String, GradingError> {
        let body = ChatCompletionRequest {
            model: &self.config.model_id,
            messages,
            temperature: self.config.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GradingError::Connection(self.describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GradingError::Connection(format!(
                "{} returned status {}: {}",
                self.endpoint, status, error_text
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| GradingError::Connection(self.describe(&e)))?;

        let envelope: Value = serde_json::from_str(&text).map_err(|e| {
            GradingError::UnexpectedResponseShape(format!("response body is not JSON: {}", e))
        })?;

        let content = extract_content(&envelope)?;
        tracing::debug!(chars = content.chars().count(), "received model reply");
        Ok(content)
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }
}

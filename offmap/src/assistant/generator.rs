//! Transport to the text-generation service.

use std::future::Future;

use serde::Serialize;

use super::{AssistantConfig, AssistantError};
use crate::provider::USER_AGENT;

/// Body of `POST {endpoint}/generate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stop: Vec<String>,
}

impl GenerateRequest {
    pub fn new(config: &AssistantConfig, prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            prompt,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stop: vec!["\n\n".to_string()],
        }
    }
}

/// Service that turns a prompt into a raw response body.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<String, AssistantError>> + Send;
}

/// Generator calling an HTTP endpoint with reqwest.
#[derive(Clone)]
pub struct HttpGenerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGenerator {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AssistantError> {
        let endpoint = endpoint.into();
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| AssistantError::Connection {
                endpoint: endpoint.clone(),
                source,
            })?;
        Ok(Self { client, endpoint })
    }

    /// Full URL of the generate call.
    pub fn generate_url(&self) -> String {
        format!("{}/generate", self.endpoint.trim_end_matches('/'))
    }
}

impl TextGenerator for HttpGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, AssistantError> {
        let url = self.generate_url();
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|source| AssistantError::Connection {
                endpoint: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(AssistantError::Status(response.status().as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| AssistantError::Body(e.to_string()))
    }
}

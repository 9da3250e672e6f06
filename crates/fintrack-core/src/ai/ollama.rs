//! Ollama backend implementation
//!
//! Uses the Ollama HTTP API at `/api/generate` for classification.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::{http_client, AIBackend, CLASSIFY_MAX_TOKENS, CLASSIFY_SYSTEM_PROMPT};

pub const DEFAULT_MODEL: &str = "llama3.2";

/// Ollama backend for local classification
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables
    ///
    /// Required: `OLLAMA_HOST`
    /// Optional: `OLLAMA_MODEL` (default: llama3.2)
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Some(Self::new(&host, &model))
    }
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn classify_vendor(&self, vendor: &str) -> Result<String> {
        let request = OllamaRequest {
            model: &self.model,
            system: CLASSIFY_SYSTEM_PROMPT,
            prompt: vendor,
            stream: false,
            options: OllamaOptions {
                temperature: 0.0,
                num_predict: CLASSIFY_MAX_TOKENS,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::External(format!("Ollama error {}: {}", status, body)));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!(vendor = %vendor, response = %ollama_response.response, "Ollama response");

        Ok(ollama_response.response.trim().to_string())
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

//! Ollama client for local language-model completions.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, info};

use super::ChatModel;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2:1b";

/// Low temperature keeps field extraction reproducible.
const TEMPERATURE: f64 = 0.1;
/// The invoice contract fits comfortably in this many tokens.
const NUM_PREDICT: u32 = 400;

/// Client for the Ollama generate API.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Create a client from `OLLAMA_URL` / `OLLAMA_MODEL`, with local
    /// defaults for both.
    pub fn from_env() -> Self {
        let base_url = env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(base_url, model)
    }

    /// One-shot availability probe, meant to be called at startup. The
    /// orchestrator caches the answer and wires the model into the engine
    /// only when it succeeds.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(model = %self.model, "ollama is available");
                true
            }
            Ok(resp) => {
                info!(status = %resp.status(), "ollama answered but is not healthy");
                false
            }
            Err(e) => {
                info!(error = %e, "ollama is not reachable");
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl ChatModel for OllamaClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: NUM_PREDICT,
            },
        };

        debug!(model = %self.model, "sending generate request to ollama");

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("failed to send request to ollama")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("ollama API error ({}): {}", status, error_text);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("failed to parse ollama response")?;

        debug!(chars = body.response.len(), "ollama completion received");
        Ok(body.response)
    }
}

// ── Ollama API request/response types ───────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

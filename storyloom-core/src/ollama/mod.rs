//! Ollama client
//!
//! Thin async wrapper over the local Ollama REST API, plus adapters that plug
//! it into the embedding and story generation seams.
//!
//! API Documentation: https://github.com/ollama/ollama/blob/main/docs/api.md

pub mod types;

use crate::embeddings::model::check_dimensions;
use crate::embeddings::{self, Embedder};
use crate::http::{build_client, error_for_status, join_url, truncate};
use crate::story::{self, TextGenerator};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use types::*;

pub use types::{
    ChatMessage, ChatRequest, ChatResponse, GenerateRequest, GenerateResponse, ModelDetails,
    ModelInfo, ModelOptions, PullResponse,
};

pub const DEFAULT_HOST: &str = "http://localhost:11434";

#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ollama returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Expected {expected} embeddings, got {actual}")]
    EmbeddingCount { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, OllamaError>;

/// Client for a single Ollama server
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
}

impl OllamaClient {
    pub fn new(host: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            host: host.into(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Send a request, map non-2xx to `Api`, and parse the JSON body
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let response = error_for_status(response)
            .await
            .map_err(|(status, body)| OllamaError::Api { status, body })?;

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| OllamaError::Parse(format!("{}: {}", e, truncate(&text, 200))))
    }

    fn url(&self, endpoint: &str) -> String {
        join_url(&self.host, endpoint)
    }

    /// Single non-streaming completion
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        debug!(model = %request.model, "POST /api/generate");
        self.send_json(self.client.post(self.url("/api/generate")).json(request))
            .await
    }

    /// Single non-streaming chat turn
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        debug!(model = %request.model, messages = request.messages.len(), "POST /api/chat");
        self.send_json(self.client.post(self.url("/api/chat")).json(request))
            .await
    }

    /// Embed each input; the result has one vector per input, in order
    pub async fn embed(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(model, inputs = inputs.len(), "POST /api/embed");
        let body = EmbedRequest {
            model,
            input: inputs,
        };
        let response: EmbedResponse = self
            .send_json(self.client.post(self.url("/api/embed")).json(&body))
            .await?;

        if response.embeddings.len() != inputs.len() {
            return Err(OllamaError::EmbeddingCount {
                expected: inputs.len(),
                actual: response.embeddings.len(),
            });
        }
        Ok(response.embeddings)
    }

    /// Models installed on the server
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response: TagsResponse = self.send_json(self.client.get(self.url("/api/tags"))).await?;
        Ok(response.models)
    }

    /// Download a model, waiting until the pull completes
    pub async fn pull_model(&self, name: &str) -> Result<PullResponse> {
        let body = ModelRequest {
            model: name,
            stream: Some(false),
        };
        self.send_json(self.client.post(self.url("/api/pull")).json(&body))
            .await
    }

    pub async fn delete_model(&self, name: &str) -> Result<()> {
        let body = ModelRequest {
            model: name,
            stream: None,
        };
        let response = self
            .client
            .delete(self.url("/api/delete"))
            .json(&body)
            .send()
            .await?;
        error_for_status(response)
            .await
            .map_err(|(status, body)| OllamaError::Api { status, body })?;
        Ok(())
    }

    /// Server version string
    pub async fn version(&self) -> Result<String> {
        let response: VersionResponse = self
            .send_json(self.client.get(self.url("/api/version")))
            .await?;
        Ok(response.version)
    }
}

/// [`Embedder`] backed by an Ollama embedding model
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimension,
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn embedding_dim(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> embeddings::Result<Vec<Vec<f32>>> {
        let vectors = self.client.embed(&self.model, texts).await?;
        check_dimensions(&vectors, self.dimension)?;
        Ok(vectors)
    }
}

/// [`TextGenerator`] backed by an Ollama generation model
pub struct OllamaGenerator {
    client: OllamaClient,
    model: String,
    options: ModelOptions,
}

impl OllamaGenerator {
    pub fn new(client: OllamaClient, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            options: ModelOptions {
                temperature: Some(temperature),
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, system: &str, prompt: &str) -> story::Result<String> {
        let request = GenerateRequest::new(&self.model, prompt)
            .with_system(system)
            .with_options(self.options.clone());
        let response = self.client.generate(&request).await?;
        Ok(response.response)
    }
}

//! LLM Client — the single point of entry for all Vertex AI calls in CV Tailor.
//!
//! Handlers never hold a concrete client: `AppState` carries an
//! `Arc<dyn TextGenerator>` built once at startup, and tests swap in a fake.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{future, Stream, StreamExt};
use gcp_auth::TokenProvider;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

pub mod sse;
pub mod types;

use sse::{SseEvent, SseStream};
use types::{
    permissive_safety_settings, Content, GenerateContentRequest, GenerationChunk,
    GenerationConfig,
};

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Covers the whole streamed body, so it is sized for a full 65k-token answer.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

/// Ordered, lazily produced response chunks. Dropping it closes the connection.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<GenerationChunk, LlmError>> + Send>>;

/// A hosted text-generation backend that streams its answer.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Opens a generation stream for one user message under a system instruction.
    /// Errors before the first chunk (auth, HTTP status) are returned here; later
    /// failures arrive as `Err` items on the stream.
    async fn stream_generate(&self, prompt: &str, system: &str) -> Result<ChunkStream, LlmError>;
}

enum Credentials {
    /// Bearer token supplied through configuration.
    Static(String),
    /// Application Default Credentials; the provider caches and refreshes tokens.
    ApplicationDefault(Arc<dyn TokenProvider>),
}

#[derive(Debug, Deserialize)]
struct VertexError {
    error: VertexErrorBody,
}

#[derive(Debug, Deserialize)]
struct VertexErrorBody {
    message: String,
}

/// Gemini on Vertex AI via `streamGenerateContent?alt=sse`.
pub struct VertexClient {
    client: Client,
    credentials: Credentials,
    base_url: String,
    project: String,
    location: String,
    model: String,
    generation_config: GenerationConfig,
}

impl VertexClient {
    /// Builds the client from configuration, resolving ADC when no static token is set.
    pub async fn from_config(config: &Config) -> Result<Self, LlmError> {
        let credentials = match &config.vertex_access_token {
            Some(token) => Credentials::Static(token.clone()),
            None => {
                let provider = gcp_auth::provider()
                    .await
                    .map_err(|e| LlmError::Auth(format!("Failed to load ADC: {e}")))?;
                info!("Using Application Default Credentials for Vertex AI");
                Credentials::ApplicationDefault(provider)
            }
        };

        Self::with_credentials(config, credentials)
    }

    fn with_credentials(config: &Config, credentials: Credentials) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let base_url = config
            .vertex_base_url
            .clone()
            .unwrap_or_else(|| default_base_url(&config.vertex_location));

        Ok(Self {
            client,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
            project: config.vertex_project.clone(),
            location: config.vertex_location.clone(),
            model: config.model_name.clone(),
            generation_config: GenerationConfig::default(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.project, self.location, self.model
        )
    }

    async fn bearer_token(&self) -> Result<String, LlmError> {
        match &self.credentials {
            Credentials::Static(token) => Ok(token.clone()),
            Credentials::ApplicationDefault(provider) => provider
                .token(&[CLOUD_PLATFORM_SCOPE])
                .await
                .map(|token| token.as_str().to_string())
                .map_err(|e| LlmError::Auth(format!("Failed to get ADC token: {e}"))),
        }
    }
}

#[async_trait]
impl TextGenerator for VertexClient {
    async fn stream_generate(&self, prompt: &str, system: &str) -> Result<ChunkStream, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            system_instruction: Content::instruction(system),
            generation_config: self.generation_config.clone(),
            safety_settings: permissive_safety_settings(),
        };

        let token = self.bearer_token().await?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(token)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<VertexError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Vertex stream opened (model: {})", self.model);

        let chunks = SseStream::new(Box::pin(response.bytes_stream()))
            .filter_map(|event| future::ready(decode_event(event)))
            .inspect(|chunk| {
                if let Ok(chunk) = chunk {
                    log_chunk_metadata(chunk);
                }
            });

        Ok(Box::pin(chunks))
    }
}

fn default_base_url(location: &str) -> String {
    if location == "global" {
        "https://aiplatform.googleapis.com".to_string()
    } else {
        format!("https://{location}-aiplatform.googleapis.com")
    }
}

/// `[DONE]` markers and empty events carry no chunk. An in-band `error`
/// payload becomes `LlmError::Api`.
fn decode_event(event: Result<SseEvent, LlmError>) -> Option<Result<GenerationChunk, LlmError>> {
    let event = match event {
        Ok(event) if event.is_done() || event.data.trim().is_empty() => return None,
        Ok(event) => event,
        Err(e) => return Some(Err(e)),
    };

    let mut chunk = match serde_json::from_str::<GenerationChunk>(&event.data) {
        Ok(chunk) => chunk,
        Err(e) => return Some(Err(LlmError::Parse(e))),
    };

    match chunk.error.take() {
        Some(error) => Some(Err(LlmError::Api {
            status: error.code,
            message: error.message,
        })),
        None => Some(Ok(chunk)),
    }
}

fn log_chunk_metadata(chunk: &GenerationChunk) {
    if let Some(reason) = chunk
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        warn!("Vertex blocked the prompt: {reason}");
    }
    if let Some(reason) = chunk
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref())
    {
        debug!("Vertex finish reason: {reason}");
    }
    if let Some(usage) = &chunk.usage_metadata {
        debug!(
            "Vertex usage: prompt_tokens={:?}, output_tokens={:?}, total_tokens={:?}",
            usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
        );
    }
}

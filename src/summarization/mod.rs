//! Summarization providers.
//!
//! Every backend, local or hosted, implements [`SummarizationClient`] so the processing
//! pipeline wraps exactly one seam in its retry policy. Hosted adapters issue HTTP requests
//! directly with `reqwest`; the extractive adapter runs LexRank in-process.

use crate::config::{Config, SummarizationProvider};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod extractive;
mod gemini;
mod ollama;
mod openai;
mod vertex;

pub use extractive::ExtractiveSummarizer;
pub use gemini::GeminiSummarizationClient;
pub use ollama::OllamaSummarizationClient;
pub use openai::OpenAiSummarizationClient;
pub use vertex::VertexSummarizationClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Sampling temperature sent to hosted models.
pub(crate) const TEMPERATURE: f32 = 0.3;
/// Output token cap sent to hosted models.
pub(crate) const MAX_OUTPUT_TOKENS: u32 = 256;

/// Errors surfaced while attempting summarization.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider was misconfigured before any request was made.
    #[error("Summarization provider misconfigured: {0}")]
    Configuration(String),
    /// Provider was unreachable or the endpoint does not exist.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider rejected the request because of rate limiting or quota.
    #[error("Summarization provider rate limited the request: {0}")]
    RateLimited(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

impl SummarizationClientError {
    /// True for quota and rate-limit rejections.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// A single piece of text to summarize.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    /// Text already cut to the chunk budget.
    pub text: String,
    /// Line budget requested from abstractive models.
    pub max_lines: usize,
    /// Sentence count requested from extractive summarizers.
    pub sentences: usize,
}

impl SummarizationRequest {
    /// Prompt sent to abstractive models.
    pub fn prompt(&self) -> String {
        format!(
            "Summarize the following content in at most {} lines:\n\n{}",
            self.max_lines.max(1),
            self.text
        )
    }
}

/// Interface implemented by summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Stable provider label (`ollama`, `openai`, ...).
    fn provider(&self) -> &'static str;

    /// True for summarizers that run in-process and take the whole document.
    fn is_local(&self) -> bool {
        false
    }

    /// Generate a summary for the request.
    async fn generate_summary(
        &self,
        request: &SummarizationRequest,
    ) -> Result<String, SummarizationClientError>;

    /// Enumerate models the provider can summarize with.
    async fn list_models(&self) -> Result<Vec<String>, SummarizationClientError>;
}

/// Build the summarization client selected by configuration.
pub fn build_client(
    config: &Config,
) -> Result<Arc<dyn SummarizationClient>, SummarizationClientError> {
    let model = config.summarization_model.clone();
    let client: Arc<dyn SummarizationClient> = match config.summarization_provider {
        SummarizationProvider::Extractive => Arc::new(ExtractiveSummarizer::from_model(
            model.as_deref(),
        )),
        SummarizationProvider::Ollama => Arc::new(OllamaSummarizationClient::new(
            config.ollama_url.clone(),
            model,
        )?),
        SummarizationProvider::OpenAI => Arc::new(OpenAiSummarizationClient::new(
            required(&config.openai_api_key, "OPENAI_API_KEY")?,
            config.openai_base_url.clone(),
            model,
        )?),
        SummarizationProvider::Gemini => Arc::new(GeminiSummarizationClient::new(
            required(&config.gemini_api_key, "GEMINI_API_KEY")?,
            config.gemini_base_url.clone(),
            model,
        )?),
        SummarizationProvider::Vertex => Arc::new(VertexSummarizationClient::new(
            required(&config.vertex_project_id, "VERTEX_PROJECT_ID")?,
            config.vertex_location.clone(),
            required(&config.vertex_access_token, "VERTEX_ACCESS_TOKEN")?,
            config.vertex_base_url.clone(),
            model,
        )?),
    };
    tracing::info!(provider = client.provider(), "Summarization client initialized");
    Ok(client)
}

fn required(value: &Option<String>, key: &str) -> Result<String, SummarizationClientError> {
    value
        .clone()
        .ok_or_else(|| SummarizationClientError::Configuration(format!("{key} is not set")))
}

/// Shared `reqwest` client settings for hosted providers.
pub(crate) fn http_client(user_agent: &str) -> Result<Client, SummarizationClientError> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|error| {
            SummarizationClientError::Configuration(format!("failed to build HTTP client: {error}"))
        })
}

/// Translate a non-success HTTP status into a summarization error.
pub(crate) fn error_for_status(
    provider: &str,
    status: StatusCode,
    body: String,
) -> SummarizationClientError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            SummarizationClientError::RateLimited(format!("{provider} returned {status}: {body}"))
        }
        StatusCode::NOT_FOUND => SummarizationClientError::ProviderUnavailable(format!(
            "{provider} returned {status}: {body}"
        )),
        _ => SummarizationClientError::GenerationFailed(format!(
            "{provider} returned {status}: {body}"
        )),
    }
}

/// Send a request and decode its JSON body, mapping transport and status failures.
pub(crate) async fn send_json<T: serde::de::DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T, SummarizationClientError> {
    let response = request.send().await.map_err(|error| {
        SummarizationClientError::ProviderUnavailable(format!("failed to reach {provider}: {error}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_for_status(provider, status, body));
    }

    response.json().await.map_err(|error| {
        SummarizationClientError::InvalidResponse(format!(
            "failed to decode {provider} response: {error}"
        ))
    })
}

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_CHUNK_BUDGET: usize = 1000;
const DEFAULT_CHUNK_MAX_SEGMENTS: usize = 10;
const DEFAULT_SUMMARY_MAX_LINES: usize = 3;
const DEFAULT_SUMMARY_SENTENCES: usize = 5;
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 4;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
const DEFAULT_RETRY_MIN_DELAY_MS: u64 = 1_000;
const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5_000;
const DEFAULT_VERTEX_LOCATION: &str = "us-central1";
const DEFAULT_LOCAL_ROOT: &str = "data";
const DEFAULT_SQLITE_PATH: &str = "pdfsum.db";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration shared by every surface (HTTP, MCP, CLI).
///
/// Loaded once at startup and handed to components behind an `Arc`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Backend that turns extracted text into a summary.
    pub summarization_provider: SummarizationProvider,
    /// Model identifier passed to hosted providers.
    pub summarization_model: Option<String>,
    /// Base URL of a local Ollama runtime.
    pub ollama_url: Option<String>,
    /// API key for the OpenAI chat completions API.
    pub openai_api_key: Option<String>,
    /// Optional override for the OpenAI base URL.
    pub openai_base_url: Option<String>,
    /// API key for the Google Generative Language API.
    pub gemini_api_key: Option<String>,
    /// Optional override for the Generative Language base URL.
    pub gemini_base_url: Option<String>,
    /// Google Cloud project hosting Vertex AI models.
    pub vertex_project_id: Option<String>,
    /// Vertex AI region.
    pub vertex_location: String,
    /// OAuth access token used for Vertex AI predictions.
    pub vertex_access_token: Option<String>,
    /// Optional override for the Vertex AI endpoint base URL.
    pub vertex_base_url: Option<String>,
    /// Line budget requested from abstractive providers.
    pub summary_max_lines: usize,
    /// Sentence count produced by the extractive summarizer.
    pub summary_sentences: usize,
    /// How extracted text is split before summarization.
    pub chunk_mode: ChunkMode,
    /// Unit used to measure `chunk_budget`.
    pub chunk_unit: BudgetUnit,
    /// Size budget applied to each segment sent to the summarizer.
    pub chunk_budget: usize,
    /// Upper bound on segments produced by the per-page and semantic modes.
    pub chunk_max_segments: usize,
    /// Total attempts made against the summarizer before giving up.
    pub retry_max_attempts: u32,
    /// Base delay for exponential backoff, in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Lower bound for any backoff delay, in milliseconds.
    pub retry_min_delay_ms: u64,
    /// Upper bound for any backoff delay, in milliseconds.
    pub retry_max_delay_ms: u64,
    /// Where PDFs and summaries are persisted.
    pub storage_backend: StorageBackend,
    /// Root directory for the `local` storage backend.
    pub storage_local_root: PathBuf,
    /// Bucket used by the `gcs` storage backend.
    pub gcs_bucket_name: Option<String>,
    /// Base64-encoded service account key for the `gcs` storage backend.
    pub gcs_service_account_key_b64: Option<String>,
    /// Database file used by the `sqlite` storage backend.
    pub sqlite_path: PathBuf,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Local LexRank summarizer; no network access.
    Extractive,
    /// Local Ollama runtime.
    Ollama,
    /// Hosted OpenAI chat completions.
    OpenAI,
    /// Google Generative Language API (Gemini).
    Gemini,
    /// Vertex AI text models served through `:predict`.
    Vertex,
}

/// Segmentation applied to extracted text before summarization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkMode {
    /// Whole document, truncated to the budget.
    Full,
    /// One segment per non-empty page.
    PerPage,
    /// Semantic segments bounded by the budget.
    Semantic,
}

/// Unit in which the chunk budget is measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetUnit {
    /// Unicode scalar values.
    Characters,
    /// Tokenizer tokens for the configured model.
    Tokens,
}

/// Persistence backends for PDFs and summaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Nothing is persisted.
    None,
    /// Object layout on the local filesystem.
    Local,
    /// Google Cloud Storage bucket.
    Gcs,
    /// Local SQLite database.
    Sqlite,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            summarization_provider: load_env_optional("SUMMARIZATION_PROVIDER")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("SUMMARIZATION_PROVIDER".into()))
                })
                .transpose()?
                .unwrap_or(defaults.summarization_provider),
            summarization_model: load_env_optional("SUMMARIZATION_MODEL"),
            ollama_url: load_env_optional("OLLAMA_URL"),
            openai_api_key: load_env_optional("OPENAI_API_KEY"),
            openai_base_url: load_env_optional("OPENAI_BASE_URL"),
            gemini_api_key: load_env_optional("GEMINI_API_KEY"),
            gemini_base_url: load_env_optional("GEMINI_BASE_URL"),
            vertex_project_id: load_env_optional("VERTEX_PROJECT_ID"),
            vertex_location: load_env_optional("VERTEX_LOCATION")
                .unwrap_or(defaults.vertex_location),
            vertex_access_token: load_env_optional("VERTEX_ACCESS_TOKEN"),
            vertex_base_url: load_env_optional("VERTEX_BASE_URL"),
            summary_max_lines: load_env_parsed("SUMMARY_MAX_LINES", defaults.summary_max_lines)?,
            summary_sentences: load_env_parsed("SUMMARY_SENTENCES", defaults.summary_sentences)?,
            chunk_mode: load_env_choice("CHUNK_MODE", defaults.chunk_mode)?,
            chunk_unit: load_env_choice("CHUNK_UNIT", defaults.chunk_unit)?,
            chunk_budget: load_env_parsed("CHUNK_BUDGET", defaults.chunk_budget)?,
            chunk_max_segments: load_env_parsed(
                "CHUNK_MAX_SEGMENTS",
                defaults.chunk_max_segments,
            )?,
            retry_max_attempts: load_env_parsed(
                "RETRY_MAX_ATTEMPTS",
                defaults.retry_max_attempts,
            )?,
            retry_base_delay_ms: load_env_parsed(
                "RETRY_BASE_DELAY_MS",
                defaults.retry_base_delay_ms,
            )?,
            retry_min_delay_ms: load_env_parsed(
                "RETRY_MIN_DELAY_MS",
                defaults.retry_min_delay_ms,
            )?,
            retry_max_delay_ms: load_env_parsed(
                "RETRY_MAX_DELAY_MS",
                defaults.retry_max_delay_ms,
            )?,
            storage_backend: load_env_choice("STORAGE_BACKEND", defaults.storage_backend)?,
            storage_local_root: load_env_optional("STORAGE_LOCAL_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_local_root),
            gcs_bucket_name: load_env_optional("GCS_BUCKET_NAME"),
            gcs_service_account_key_b64: load_env_optional("GCS_SA_KEY_B64"),
            sqlite_path: load_env_optional("SQLITE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.sqlite_path),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field requirements such as provider credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.summarization_provider {
            SummarizationProvider::Extractive | SummarizationProvider::Ollama => {}
            SummarizationProvider::OpenAI => require(&self.openai_api_key, "OPENAI_API_KEY")?,
            SummarizationProvider::Gemini => require(&self.gemini_api_key, "GEMINI_API_KEY")?,
            SummarizationProvider::Vertex => {
                require(&self.vertex_project_id, "VERTEX_PROJECT_ID")?;
                require(&self.vertex_access_token, "VERTEX_ACCESS_TOKEN")?;
            }
        }
        if matches!(self.storage_backend, StorageBackend::Gcs) {
            require(&self.gcs_bucket_name, "GCS_BUCKET_NAME")?;
        }
        if self.chunk_budget == 0 {
            return Err(ConfigError::InvalidValue("CHUNK_BUDGET".into()));
        }
        if self.retry_max_attempts == 0 {
            return Err(ConfigError::InvalidValue("RETRY_MAX_ATTEMPTS".into()));
        }
        if self.retry_min_delay_ms > self.retry_max_delay_ms {
            return Err(ConfigError::InvalidValue("RETRY_MIN_DELAY_MS".into()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            summarization_provider: SummarizationProvider::Extractive,
            summarization_model: None,
            ollama_url: None,
            openai_api_key: None,
            openai_base_url: None,
            gemini_api_key: None,
            gemini_base_url: None,
            vertex_project_id: None,
            vertex_location: DEFAULT_VERTEX_LOCATION.to_string(),
            vertex_access_token: None,
            vertex_base_url: None,
            summary_max_lines: DEFAULT_SUMMARY_MAX_LINES,
            summary_sentences: DEFAULT_SUMMARY_SENTENCES,
            chunk_mode: ChunkMode::Full,
            chunk_unit: BudgetUnit::Characters,
            chunk_budget: DEFAULT_CHUNK_BUDGET,
            chunk_max_segments: DEFAULT_CHUNK_MAX_SEGMENTS,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            retry_min_delay_ms: DEFAULT_RETRY_MIN_DELAY_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            storage_backend: StorageBackend::None,
            storage_local_root: PathBuf::from(DEFAULT_LOCAL_ROOT),
            gcs_bucket_name: None,
            gcs_service_account_key_b64: None,
            sqlite_path: PathBuf::from(DEFAULT_SQLITE_PATH),
            server_port: None,
        }
    }
}

fn require(value: &Option<String>, key: &str) -> Result<(), ConfigError> {
    if value.is_none() {
        return Err(ConfigError::MissingVariable(key.to_string()));
    }
    Ok(())
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_parsed<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn load_env_choice<T: FromStr<Err = ()>>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|()| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

impl FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "extractive" | "lexrank" | "local" => Ok(Self::Extractive),
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "gemini" | "genai" => Ok(Self::Gemini),
            "vertex" | "vertexai" => Ok(Self::Vertex),
            _ => Err(()),
        }
    }
}

impl SummarizationProvider {
    /// Stable label used in logs and responses.
    pub fn label(self) -> &'static str {
        match self {
            Self::Extractive => "extractive",
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
            Self::Gemini => "gemini",
            Self::Vertex => "vertex",
        }
    }
}

impl FromStr for ChunkMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "full" | "truncate" => Ok(Self::Full),
            "per_page" | "page" | "pages" => Ok(Self::PerPage),
            "semantic" | "article" => Ok(Self::Semantic),
            _ => Err(()),
        }
    }
}

impl FromStr for BudgetUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "characters" | "chars" => Ok(Self::Characters),
            "tokens" => Ok(Self::Tokens),
            _ => Err(()),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "local" | "fs" => Ok(Self::Local),
            "gcs" => Ok(Self::Gcs),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(()),
        }
    }
}

/// Load `.env` (if present) and build the configuration from the environment.
pub fn load() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        provider = config.summarization_provider.label(),
        model = ?config.summarization_model,
        chunk_mode = ?config.chunk_mode,
        chunk_budget = config.chunk_budget,
        storage = ?config.storage_backend,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    Ok(config)
}

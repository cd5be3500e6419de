//! Core data types and error definitions for the summarization pipeline.

use crate::config::{BudgetUnit, ChunkMode, Config, StorageBackend, SummarizationProvider};
use crate::extraction::ExtractionError;
use crate::storage::StorageError;
use crate::summarization::SummarizationClientError;
use serde::Serialize;
use thiserror::Error;

/// Leading glyph of every user-visible failure text.
pub const ERROR_SENTINEL: &str = "⚠️";
/// Message shown when a PDF has no extractable text.
pub const NO_TEXT_MESSAGE: &str = "No text could be extracted from the PDF.";
/// Message shown when the provider keeps rejecting requests with HTTP 429.
pub const RATE_LIMIT_MESSAGE: &str =
    "⚠️ The summarization provider is rate limiting requests; try again later.";

/// True when `text` is a failure sentinel rather than a summary.
pub fn is_error_sentinel(text: &str) -> bool {
    text.trim_start().starts_with(ERROR_SENTINEL)
}

/// Errors produced while segmenting text.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Configuration asked for an impossible budget.
    #[error("chunk budget must be greater than zero")]
    InvalidBudget,
}

/// Errors emitted by the summary service.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// PDF could not be read or held no text.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Segmentation failed.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Summarizer failed on every attempt.
    #[error("Summarization failed: {0}")]
    Summarizer(#[from] SummarizationClientError),
    /// Persistence backend failed.
    #[error("Storage request failed: {0}")]
    Storage(#[from] StorageError),
    /// Operation needs a store but none is configured.
    #[error("No storage backend is configured")]
    StorageDisabled,
    /// Stored document does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// Filename is not a plain `*.pdf` name.
    #[error("Invalid PDF filename: {0}")]
    InvalidFilename(String),
}

impl SummaryError {
    /// True when the document parsed but contained no text.
    pub fn is_no_text(&self) -> bool {
        matches!(self, Self::Extraction(ExtractionError::NoText))
    }

    /// Text shown to the user in place of a summary.
    pub fn user_message(&self) -> String {
        match self {
            Self::Extraction(ExtractionError::NoText) => NO_TEXT_MESSAGE.to_string(),
            Self::Summarizer(error) if error.is_rate_limited() => RATE_LIMIT_MESSAGE.to_string(),
            Self::Summarizer(error) => format!("{ERROR_SENTINEL} Summary failed: {error}"),
            other => other.to_string(),
        }
    }
}

/// Per-request overrides.
#[derive(Debug, Clone, Default)]
pub struct SummaryOptions {
    /// Segmentation mode; configuration default when `None`.
    pub mode: Option<ChunkMode>,
    /// Extractive sentence count; configuration default when `None`.
    pub sentences: Option<usize>,
    /// Skip cached and persisted summaries.
    pub force: bool,
}

/// Settings that shape a summary's text. Reuse requires an exact match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SummaryVariant {
    /// Effective segmentation mode.
    pub mode: ChunkMode,
    /// Effective extractive sentence count.
    pub sentences: usize,
}

impl SummaryVariant {
    /// Apply request overrides on top of the configured defaults.
    pub fn resolve(options: &SummaryOptions, config: &Config) -> Self {
        Self {
            mode: options.mode.unwrap_or(config.chunk_mode),
            sentences: options.sentences.unwrap_or(config.summary_sentences).max(1),
        }
    }

    /// True when no override changes the configured defaults.
    ///
    /// Persisted summaries are always built with the defaults.
    pub fn is_default(&self, config: &Config) -> bool {
        *self == Self::resolve(&SummaryOptions::default(), config)
    }
}

/// Result of a successful summarization.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryOutcome {
    /// Document the summary describes.
    pub filename: String,
    /// Summary text.
    pub summary: String,
    /// Whether the summary was reused instead of generated.
    pub cached: bool,
    /// Number of segments sent to the summarizer (0 when reused).
    pub segments: usize,
    /// Provider label that produced the summary.
    pub provider: String,
    /// Characters of extracted text the summary was built from (0 when reused).
    pub input_chars: usize,
}

/// Effective pipeline settings reported to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSettings {
    /// Active summarization provider.
    pub provider: SummarizationProvider,
    /// Configured model, if any.
    pub model: Option<String>,
    /// Default segmentation mode.
    pub chunk_mode: ChunkMode,
    /// Unit of the chunk budget.
    pub chunk_unit: BudgetUnit,
    /// Per-segment size budget.
    pub chunk_budget: usize,
    /// Cap on segments per document.
    pub chunk_max_segments: usize,
    /// Line budget requested from abstractive models.
    pub summary_max_lines: usize,
    /// Default extractive sentence count.
    pub summary_sentences: usize,
    /// Total summarizer attempts per segment.
    pub retry_max_attempts: u32,
    /// Persistence backend.
    pub storage_backend: StorageBackend,
}

impl PipelineSettings {
    /// Project the reportable subset of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: config.summarization_provider,
            model: config.summarization_model.clone(),
            chunk_mode: config.chunk_mode,
            chunk_unit: config.chunk_unit,
            chunk_budget: config.chunk_budget,
            chunk_max_segments: config.chunk_max_segments,
            summary_max_lines: config.summary_max_lines,
            summary_sentences: config.summary_sentences,
            retry_max_attempts: config.retry_max_attempts,
            storage_backend: config.storage_backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_serialize_with_lowercase_labels() {
        let value = serde_json::to_value(PipelineSettings::from_config(&Config::default()))
            .expect("serialize");
        assert_eq!(value["provider"], "extractive");
        assert_eq!(value["chunk_mode"], "full");
        assert_eq!(value["storage_backend"], "none");
    }

    #[test]
    fn variant_resolves_overrides_against_config() {
        let config = Config::default();
        let default = SummaryVariant::resolve(&SummaryOptions::default(), &config);
        assert_eq!(default.mode, config.chunk_mode);
        assert!(default.is_default(&config));

        let per_page = SummaryVariant::resolve(
            &SummaryOptions {
                mode: Some(ChunkMode::PerPage),
                ..SummaryOptions::default()
            },
            &config,
        );
        assert!(!per_page.is_default(&config));

        let zero = SummaryVariant::resolve(
            &SummaryOptions {
                sentences: Some(0),
                ..SummaryOptions::default()
            },
            &config,
        );
        assert_eq!(zero.sentences, 1);
    }

    #[test]
    fn sentinel_detection_ignores_leading_whitespace() {
        assert!(is_error_sentinel("  ⚠️ Summary failed: timeout"));
        assert!(!is_error_sentinel("A normal summary"));
    }

    #[test]
    fn user_messages_distinguish_failure_kinds() {
        let no_text = SummaryError::from(ExtractionError::NoText);
        assert!(no_text.is_no_text());
        assert_eq!(no_text.user_message(), NO_TEXT_MESSAGE);

        let limited = SummaryError::from(SummarizationClientError::RateLimited("429".into()));
        assert_eq!(limited.user_message(), RATE_LIMIT_MESSAGE);

        let failed = SummaryError::from(SummarizationClientError::GenerationFailed("boom".into()));
        let message = failed.user_message();
        assert!(is_error_sentinel(&message));
        assert!(message.starts_with("⚠️ Summary failed: "));
        assert!(message.contains("boom"));
    }
}

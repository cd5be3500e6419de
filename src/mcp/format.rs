//! Formatting helpers shared across MCP handlers and resources.

use crate::processing::PipelineSettings;
use rmcp::model::ResourceContents;
use schemars::JsonSchema;
use serde::Serialize;

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}

/// Settings snapshot returned by the `settings` resource.
#[derive(Debug, Serialize, JsonSchema)]
pub(crate) struct SettingsSnapshot {
    /// Provider label, e.g. `extractive` or `openai`.
    pub(crate) provider: String,
    /// Configured model; `None` selects the provider default.
    pub(crate) model: Option<String>,
    /// Chunking defaults.
    pub(crate) chunking: ChunkingSnapshot,
    /// Summary length defaults.
    pub(crate) summary: SummaryDefaultsSnapshot,
    /// Total summarizer attempts per segment.
    pub(crate) retry_max_attempts: u32,
    /// Persistence backend label.
    pub(crate) storage_backend: String,
}

/// Chunking defaults reported to clients.
#[derive(Debug, Serialize, JsonSchema)]
pub(crate) struct ChunkingSnapshot {
    pub(crate) mode: String,
    pub(crate) unit: String,
    pub(crate) budget: usize,
    pub(crate) max_segments: usize,
}

/// Summary length defaults reported to clients.
#[derive(Debug, Serialize, JsonSchema)]
pub(crate) struct SummaryDefaultsSnapshot {
    pub(crate) max_lines: usize,
    pub(crate) sentences: usize,
}

impl From<PipelineSettings> for SettingsSnapshot {
    fn from(settings: PipelineSettings) -> Self {
        Self {
            provider: label(&settings.provider),
            model: settings.model,
            chunking: ChunkingSnapshot {
                mode: label(&settings.chunk_mode),
                unit: label(&settings.chunk_unit),
                budget: settings.chunk_budget,
                max_segments: settings.chunk_max_segments,
            },
            summary: SummaryDefaultsSnapshot {
                max_lines: settings.summary_max_lines,
                sentences: settings.summary_sentences,
            },
            retry_max_attempts: settings.retry_max_attempts,
            storage_backend: label(&settings.storage_backend),
        }
    }
}

fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(text)) => text,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}

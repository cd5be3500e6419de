//! Summary service coordinating extraction, chunking, summarization, caching, and persistence.

use crate::{
    config::Config,
    document::{Document, compute_digest, is_valid_pdf_filename},
    extraction::{self, ExtractionError},
    metrics::{MetricsSnapshot, SummaryMetrics},
    processing::{
        cache::SummaryCache,
        chunking::{ChunkPolicy, Segment},
        retry::RetryPolicy,
        types::{
            PipelineSettings, SummaryError, SummaryOptions, SummaryOutcome, SummaryVariant,
            is_error_sentinel,
        },
    },
    storage::{self, DocumentStore, StoredDocument},
    summarization::{self, SummarizationClient, SummarizationClientError, SummarizationRequest},
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Runs the summarization pipeline: extract → segment → summarize with retries → persist.
///
/// The service owns the summarization client, the optional document store, the summary cache,
/// and the metrics registry so that the HTTP surface, the MCP tools, and the CLI share the same
/// components. Construct it once near process start and share it through an `Arc`.
pub struct SummaryService {
    config: Arc<Config>,
    client: Arc<dyn SummarizationClient>,
    store: Option<Arc<dyn DocumentStore>>,
    cache: SummaryCache,
    retry: RetryPolicy,
    metrics: Arc<SummaryMetrics>,
}

/// Abstraction over the summary pipeline used by external surfaces (HTTP, MCP, CLI).
#[async_trait]
pub trait SummaryApi: Send + Sync {
    /// Summarize an uploaded PDF without caching or persisting anything.
    async fn summarize_upload(
        &self,
        document: Document,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, SummaryError>;

    /// Persist a PDF, replacing any previous upload with the same name.
    async fn upload(&self, document: Document) -> Result<StoredDocument, SummaryError>;

    /// Summarize a stored PDF, reusing cached or persisted summaries unless forced.
    async fn summarize_stored(
        &self,
        filename: &str,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, SummaryError>;

    /// Enumerate stored PDFs.
    async fn list_documents(&self) -> Result<Vec<StoredDocument>, SummaryError>;

    /// Enumerate models offered by the active provider.
    async fn list_models(&self) -> Result<Vec<String>, SummaryError>;

    /// Effective pipeline settings.
    fn settings(&self) -> PipelineSettings;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

struct Generated {
    summary: String,
    segments: usize,
    input_chars: usize,
}

impl SummaryService {
    /// Assemble a service from already-built components.
    pub fn new(
        config: Arc<Config>,
        client: Arc<dyn SummarizationClient>,
        store: Option<Arc<dyn DocumentStore>>,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            config,
            client,
            store,
            cache: SummaryCache::new(),
            retry,
            metrics: Arc::new(SummaryMetrics::new()),
        }
    }

    /// Build the provider client and document store described by `config`.
    pub fn from_config(config: Arc<Config>) -> Result<Self, SummaryError> {
        tracing::info!(
            provider = config.summarization_provider.label(),
            "Initializing summarization client"
        );
        let client = summarization::build_client(&config)?;
        let store = storage::from_config(&config)?;
        Ok(Self::new(config, client, store))
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Summarize an uploaded PDF without caching or persisting anything.
    pub async fn summarize_upload(
        &self,
        document: Document,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, SummaryError> {
        ensure_pdf_filename(&document.filename)?;
        tracing::info!(
            document = %document.filename,
            bytes = document.bytes.len(),
            "Summarizing upload"
        );
        let variant = SummaryVariant::resolve(&options, &self.config);
        let generated = self
            .generate(&document.filename, &document.bytes, variant)
            .await?;
        Ok(self.fresh_outcome(document.filename, generated))
    }

    /// Persist a PDF and drop any summary remembered for its name.
    pub async fn upload(&self, document: Document) -> Result<StoredDocument, SummaryError> {
        ensure_pdf_filename(&document.filename)?;
        let store = self.require_store()?;
        let size = document.bytes.len() as u64;
        if store.get_pdf(&document.filename).await?.as_ref() == Some(&document.bytes) {
            let has_summary = store
                .get_summary(&document.filename)
                .await?
                .is_some_and(|summary| !is_error_sentinel(&summary));
            tracing::debug!(document = %document.filename, "Upload matches stored copy");
            return Ok(StoredDocument {
                filename: document.filename,
                size,
                has_summary,
            });
        }
        store
            .put_pdf(&document.filename, document.bytes.clone())
            .await?;
        self.cache.invalidate(&document.filename);
        tracing::info!(
            document = %document.filename,
            size,
            backend = store.backend(),
            "Stored PDF"
        );
        Ok(StoredDocument {
            filename: document.filename,
            size,
            has_summary: false,
        })
    }

    /// Summarize a stored PDF.
    ///
    /// Lookup order is cache, then persisted summary, then generation. `force` skips both
    /// lookups and overwrites what was stored. Only summaries built with the configured mode and
    /// sentence count are persisted; overrides are cached per variant.
    pub async fn summarize_stored(
        &self,
        filename: &str,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, SummaryError> {
        ensure_pdf_filename(filename)?;
        let store = self.require_store()?;
        let bytes = store
            .get_pdf(filename)
            .await?
            .ok_or_else(|| SummaryError::NotFound(filename.to_string()))?;
        let digest = compute_digest(&bytes);
        let variant = SummaryVariant::resolve(&options, &self.config);
        let persistable = variant.is_default(&self.config);

        if !options.force {
            if let Some(summary) = self.cache.get(filename, &digest, variant) {
                tracing::debug!(document = filename, "Summary served from cache");
                return Ok(self.reused_outcome(filename, summary));
            }
            if persistable {
                match store.get_summary(filename).await? {
                    Some(summary) if is_error_sentinel(&summary) => {
                        tracing::warn!(
                            document = filename,
                            "Ignoring persisted failure text; regenerating"
                        );
                    }
                    Some(summary) => {
                        tracing::debug!(document = filename, "Summary served from storage");
                        self.cache.insert(filename, &digest, variant, &summary);
                        return Ok(self.reused_outcome(filename, summary));
                    }
                    None => {}
                }
            }
        }

        let generated = self.generate(filename, &bytes, variant).await?;
        self.cache
            .insert(filename, &digest, variant, &generated.summary);
        if persistable {
            store.put_summary(filename, &generated.summary).await?;
            tracing::info!(document = filename, backend = store.backend(), "Persisted summary");
        } else {
            tracing::debug!(
                document = filename,
                mode = ?variant.mode,
                sentences = variant.sentences,
                "Summary built with overrides; kept in cache only"
            );
        }
        Ok(self.fresh_outcome(filename.to_string(), generated))
    }

    /// Enumerate stored PDFs with summary presence.
    pub async fn list_documents(&self) -> Result<Vec<StoredDocument>, SummaryError> {
        Ok(self.require_store()?.list_pdfs().await?)
    }

    /// Enumerate models offered by the active provider.
    pub async fn list_models(&self) -> Result<Vec<String>, SummaryError> {
        Ok(self.client.list_models().await?)
    }

    /// Effective pipeline settings.
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings::from_config(&self.config)
    }

    /// Return the current summarization metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn require_store(&self) -> Result<&Arc<dyn DocumentStore>, SummaryError> {
        self.store.as_ref().ok_or(SummaryError::StorageDisabled)
    }

    async fn generate(
        &self,
        filename: &str,
        bytes: &Bytes,
        variant: SummaryVariant,
    ) -> Result<Generated, SummaryError> {
        let extracted = extraction::extract_text(bytes).await?;
        let mut policy = ChunkPolicy::from_config(&self.config).with_mode(variant.mode);
        if self.client.is_local() {
            policy = policy.untruncated();
        }
        let segments = policy.segments(&extracted)?;
        if segments.is_empty() {
            return Err(ExtractionError::NoText.into());
        }

        let sentences = variant.sentences;
        let input_chars: usize = segments.iter().map(|s| s.text.chars().count()).sum();
        tracing::debug!(
            document = filename,
            segments = segments.len(),
            input_chars,
            provider = self.client.provider(),
            "Sending segments to summarizer"
        );

        let mut parts = Vec::with_capacity(segments.len());
        for segment in &segments {
            let request = SummarizationRequest {
                text: segment.text.clone(),
                max_lines: self.config.summary_max_lines,
                sentences,
            };
            match self.summarize_with_retry(&request).await {
                Ok(summary) => parts.push((segment, summary)),
                Err(error) => {
                    self.metrics.record_failure();
                    tracing::error!(
                        document = filename,
                        segment = segment.label.as_deref().unwrap_or("document"),
                        %error,
                        "Summarization failed"
                    );
                    return Err(error.into());
                }
            }
        }

        let summary = combine_parts(&parts);
        self.metrics.record_summary(input_chars as u64);
        tracing::info!(
            document = filename,
            segments = segments.len(),
            input_chars,
            "Summary generated"
        );
        Ok(Generated {
            summary,
            segments: segments.len(),
            input_chars,
        })
    }

    async fn summarize_with_retry(
        &self,
        request: &SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let client = &self.client;
        let metrics = &self.metrics;
        self.retry
            .run(client.provider(), |_attempt| async move {
                metrics.record_call();
                client.generate_summary(request).await
            })
            .await
    }

    fn fresh_outcome(&self, filename: String, generated: Generated) -> SummaryOutcome {
        SummaryOutcome {
            filename,
            summary: generated.summary,
            cached: false,
            segments: generated.segments,
            provider: self.client.provider().to_string(),
            input_chars: generated.input_chars,
        }
    }

    fn reused_outcome(&self, filename: &str, summary: String) -> SummaryOutcome {
        self.metrics.record_reuse();
        SummaryOutcome {
            filename: filename.to_string(),
            summary,
            cached: true,
            segments: 0,
            provider: self.client.provider().to_string(),
            input_chars: 0,
        }
    }
}

fn ensure_pdf_filename(filename: &str) -> Result<(), SummaryError> {
    if is_valid_pdf_filename(filename) {
        Ok(())
    } else {
        Err(SummaryError::InvalidFilename(filename.to_string()))
    }
}

/// Join per-segment summaries; labelled segments get a `Label:` header line.
fn combine_parts(parts: &[(&Segment, String)]) -> String {
    if let [(segment, summary)] = parts {
        if segment.label.is_none() {
            return summary.clone();
        }
    }
    parts
        .iter()
        .map(|(segment, summary)| match &segment.label {
            Some(label) => format!("{label}:\n{summary}"),
            None => summary.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl SummaryApi for SummaryService {
    async fn summarize_upload(
        &self,
        document: Document,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, SummaryError> {
        SummaryService::summarize_upload(self, document, options).await
    }

    async fn upload(&self, document: Document) -> Result<StoredDocument, SummaryError> {
        SummaryService::upload(self, document).await
    }

    async fn summarize_stored(
        &self,
        filename: &str,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, SummaryError> {
        SummaryService::summarize_stored(self, filename, options).await
    }

    async fn list_documents(&self) -> Result<Vec<StoredDocument>, SummaryError> {
        SummaryService::list_documents(self).await
    }

    async fn list_models(&self) -> Result<Vec<String>, SummaryError> {
        SummaryService::list_models(self).await
    }

    fn settings(&self) -> PipelineSettings {
        SummaryService::settings(self)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        SummaryService::metrics_snapshot(self)
    }
}

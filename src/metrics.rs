use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct SummaryMetrics {
    documents_summarized: AtomicU64,
    summaries_reused: AtomicU64,
    summarizer_calls: AtomicU64,
    summarizer_failures: AtomicU64,
    last_input_chars: AtomicU64,
}

impl SummaryMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly generated summary and the size of the text it was built from.
    pub fn record_summary(&self, input_chars: u64) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.last_input_chars.store(input_chars, Ordering::Relaxed);
    }

    /// Record a request answered from the cache or the store.
    pub fn record_reuse(&self) {
        self.summaries_reused.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a single invocation of the summarization provider.
    pub fn record_call(&self) {
        self.summarizer_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a summarization that failed after exhausting retries.
    pub fn record_failure(&self) {
        self.summarizer_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let last_input_chars = self.last_input_chars.load(Ordering::Relaxed);
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            summaries_reused: self.summaries_reused.load(Ordering::Relaxed),
            summarizer_calls: self.summarizer_calls.load(Ordering::Relaxed),
            summarizer_failures: self.summarizer_failures.load(Ordering::Relaxed),
            last_input_chars: (last_input_chars > 0).then_some(last_input_chars),
        }
    }
}

/// Immutable view of summarization counters used for reporting.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of summaries generated since startup.
    pub documents_summarized: u64,
    /// Requests served from the cache or persisted summaries.
    pub summaries_reused: u64,
    /// Individual provider invocations, retries included.
    pub summarizer_calls: u64,
    /// Summaries that failed after exhausting retries.
    pub summarizer_failures: u64,
    /// Characters sent to the summarizer for the most recent summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_input_chars: Option<u64>,
}

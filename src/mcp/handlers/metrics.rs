//! Handler for the metrics tool.

use std::sync::Arc;

use crate::processing::SummaryApi;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde_json::json;

/// Handle the `metrics` tool, returning the current summarization counters.
pub(crate) async fn handle_metrics(
    service: &Arc<dyn SummaryApi>,
) -> Result<CallToolResult, McpError> {
    let snapshot = service.metrics_snapshot();
    Ok(CallToolResult::structured(json!({
        "documentsSummarized": snapshot.documents_summarized,
        "summariesReused": snapshot.summaries_reused,
        "summarizerCalls": snapshot.summarizer_calls,
        "summarizerFailures": snapshot.summarizer_failures,
        "lastInputChars": snapshot.last_input_chars,
    })))
}

//! Handler for the `list-documents` tool.

use std::sync::Arc;

use crate::processing::{SummaryApi, SummaryError};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde_json::json;

/// Handle the `list-documents` tool, returning stored PDFs and whether each has a summary.
pub(crate) async fn handle_list_documents(
    service: &Arc<dyn SummaryApi>,
) -> Result<CallToolResult, McpError> {
    let documents = service.list_documents().await.map_err(|err| match err {
        SummaryError::StorageDisabled => McpError::invalid_params(err.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    })?;
    let count = documents.len();
    Ok(CallToolResult::structured(json!({
        "documents": documents,
        "count": count,
    })))
}

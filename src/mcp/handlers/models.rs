//! Handler for the `list-models` tool.

use std::sync::Arc;

use crate::processing::SummaryApi;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde_json::json;

/// Handle the `list-models` tool by asking the active provider for its models.
pub(crate) async fn handle_list_models(
    service: &Arc<dyn SummaryApi>,
) -> Result<CallToolResult, McpError> {
    let provider = service.settings().provider.label();
    let models = service
        .list_models()
        .await
        .map_err(|err| McpError::internal_error(err.to_string(), None))?;
    Ok(CallToolResult::structured(json!({
        "provider": provider,
        "models": models,
    })))
}

//! Handler for the `summarize-pdf` MCP tool.

use std::path::Path;
use std::sync::Arc;

use crate::{
    config::ChunkMode,
    document::Document,
    extraction::ExtractionError,
    mcp::handlers::parse_arguments,
    processing::{SummaryApi, SummaryError, SummaryOptions, SummaryOutcome},
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content, JsonObject},
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SummarizePdfArgs {
    path: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    sentences: Option<usize>,
    #[serde(default)]
    force: bool,
    #[serde(default)]
    persist: bool,
}

/// Handle the `summarize-pdf` tool invocation.
///
/// Reads the PDF from the local filesystem. With `persist` the document is uploaded to the
/// configured store first and summarized from there, so later calls reuse the stored summary.
pub(crate) async fn handle_summarize_pdf(
    service: &Arc<dyn SummaryApi>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: SummarizePdfArgs = parse_arguments(arguments)?;
    let options = summary_options(&args)?;

    let path = Path::new(args.path.trim());
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| McpError::invalid_params("`path` must name a file", None))?;
    let bytes = tokio::fs::read(path).await.map_err(|err| {
        McpError::invalid_params(format!("Failed to read {}: {err}", path.display()), None)
    })?;
    let document = Document::new(filename.clone(), bytes);

    let result = if args.persist {
        match service.upload(document).await {
            Ok(_) => service.summarize_stored(&filename, options).await,
            Err(error) => Err(error),
        }
    } else {
        service.summarize_upload(document, options).await
    };

    match result {
        Ok(outcome) => Ok(CallToolResult::structured(outcome_payload(&outcome, args.persist))),
        Err(error) => summary_failure(&filename, error),
    }
}

fn summary_options(args: &SummarizePdfArgs) -> Result<SummaryOptions, McpError> {
    let mode = match args.mode.as_deref() {
        None => None,
        Some(raw) => Some(raw.parse::<ChunkMode>().map_err(|_| {
            McpError::invalid_params(
                format!("`mode` must be one of full|per_page|semantic (got '{raw}')"),
                None,
            )
        })?),
    };
    if args.sentences == Some(0) {
        return Err(McpError::invalid_params(
            "`sentences` must be greater than zero",
            None,
        ));
    }
    Ok(SummaryOptions {
        mode,
        sentences: args.sentences,
        force: args.force,
    })
}

fn outcome_payload(outcome: &SummaryOutcome, persisted: bool) -> serde_json::Value {
    json!({
        "filename": outcome.filename,
        "summary": outcome.summary,
        "cached": outcome.cached,
        "segments": outcome.segments,
        "provider": outcome.provider,
        "inputChars": outcome.input_chars,
        "persisted": persisted,
    })
}

/// Map pipeline failures: user-facing summary failures become tool errors carrying the fixed
/// message, caller mistakes become invalid params, and everything else is internal.
fn summary_failure(filename: &str, error: SummaryError) -> Result<CallToolResult, McpError> {
    match &error {
        SummaryError::Extraction(ExtractionError::NoText) | SummaryError::Summarizer(_) => {
            tracing::warn!(filename, %error, "summarize-pdf returned a failure message");
            Ok(CallToolResult::error(vec![Content::text(
                error.user_message(),
            )]))
        }
        SummaryError::InvalidFilename(_)
        | SummaryError::NotFound(_)
        | SummaryError::StorageDisabled
        | SummaryError::Extraction(ExtractionError::Parse(_)) => {
            Err(McpError::invalid_params(error.user_message(), None))
        }
        _ => Err(McpError::internal_error(error.user_message(), None)),
    }
}

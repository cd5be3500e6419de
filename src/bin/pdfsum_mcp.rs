//! MCP server entrypoint (stdio transport).
//!
//! Exposes the PDF summary tools and resources over stdio for editor and agent integrations.
//! Shares all runtime configuration with the HTTP binary; logs go to the file only.
use anyhow::{Context, Result};
use pdfsum::{config, logging, mcp::PdfSumMcpServer, processing::SummaryService};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing(logging::LogTarget::FileOnly);
    let config = Arc::new(config::load().context("invalid configuration")?);

    let service = SummaryService::from_config(config)
        .context("failed to initialize the summary service")?;
    let server = PdfSumMcpServer::new(Arc::new(service));

    let running = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    running
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}

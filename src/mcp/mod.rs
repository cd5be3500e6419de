//! Model Context Protocol (MCP) integration for the PDF summarizer.
//!
//! This module wires the summary pipeline into an MCP server so editors and agent hosts can
//! summarize local PDFs over stdio. The surface area consists of:
//!
//! - Tools: `summarize-pdf`, `list-documents`, `list-models`, and `metrics`.
//! - Resources: `mcp://settings` (effective pipeline settings) and `mcp://usage`.
//!
//! Handlers, schemas, and formatting helpers are kept in focused submodules to make tests and
//! reviews small and targeted.

mod format;
pub mod handlers;
mod registry;
mod schemas;
mod server;

pub use server::PdfSumMcpServer;

/// Chunk modes accepted by the `summarize-pdf` tool.
pub(crate) const CHUNK_MODES: [&str; 3] = ["full", "per_page", "semantic"];

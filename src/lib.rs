#![deny(missing_docs)]

//! Core library for the PDF summarizer: extraction, chunking, summarization, and storage,
//! exposed over HTTP, MCP, and a CLI.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Uploaded PDF documents and filename rules.
pub mod document;
/// PDF text extraction.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Summarization counters.
pub mod metrics;
/// Summary pipeline orchestration.
pub mod processing;
/// Document and summary persistence backends.
pub mod storage;
/// Summarization providers.
pub mod summarization;

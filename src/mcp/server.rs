//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    mcp::{
        format::{SettingsSnapshot, json_resource_contents, serialize_json},
        handlers::{
            documents::handle_list_documents, metrics::handle_metrics, models::handle_list_models,
            summarize::handle_summarize_pdf,
        },
        registry, schemas,
    },
    processing::SummaryApi,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourcesResult, ListToolsResult,
        RawResource, ReadResourceRequestParam, ReadResourceResult, Resource, ServerCapabilities,
        ServerInfo, Tool, ToolAnnotations,
    },
};

const SETTINGS_URI: &str = "mcp://settings";
const USAGE_URI: &str = "mcp://usage";

/// MCP server implementation exposing the PDF summary operations.
#[derive(Clone)]
pub struct PdfSumMcpServer {
    service: Arc<dyn SummaryApi>,
    registry: Arc<registry::Registry>,
}

impl PdfSumMcpServer {
    /// Create a new MCP server backed by the supplied summary service.
    pub fn new(service: Arc<dyn SummaryApi>) -> Self {
        let mut registry = registry::Registry::new();
        registry.register_resource(SETTINGS_URI, resource_settings);
        registry.register_resource(USAGE_URI, resource_usage);

        registry.register_tool("summarize-pdf", tool_summarize_pdf);
        registry.register_tool("list-documents", tool_list_documents);
        registry.register_tool("list-models", tool_list_models);
        registry.register_tool("metrics", tool_metrics);

        Self {
            service,
            registry: Arc::new(registry),
        }
    }

    fn describe_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: Cow::Borrowed("summarize-pdf"),
                title: Some("Summarize PDF".to_string()),
                description: Some(Cow::Borrowed(
                    "Extract the text of a local PDF and return a short summary; set persist to store it for reuse.",
                )),
                input_schema: Arc::new(schemas::summarize_pdf_input_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Summarize PDF")
                        .destructive(false)
                        .idempotent(true)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("list-documents"),
                title: Some("List Stored PDFs".to_string()),
                description: Some(Cow::Borrowed(
                    "See which PDFs are stored and which already have a summary.",
                )),
                input_schema: Arc::new(schemas::empty_object_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("List Stored PDFs")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("list-models"),
                title: Some("List Models".to_string()),
                description: Some(Cow::Borrowed(
                    "List models offered by the configured summarization provider.",
                )),
                input_schema: Arc::new(schemas::empty_object_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("List Models")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("metrics"),
                title: Some("Metrics Snapshot".to_string()),
                description: Some(Cow::Borrowed(
                    "Check summaries produced, cache reuse, and summarizer failures at a glance.",
                )),
                input_schema: Arc::new(schemas::empty_object_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Metrics Snapshot")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
        ]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut settings = RawResource::new(SETTINGS_URI, "settings");
        settings.description =
            Some("Effective provider, chunking, retry, and storage settings".into());

        let mut usage = RawResource::new(USAGE_URI, "usage");
        usage.description = Some(
            "Recommended tool flow: summarize-pdf with persist, then list-documents to revisit."
                .into(),
        );

        vec![settings.no_annotation(), usage.no_annotation()]
    }
}

fn resource_settings(
    server: &PdfSumMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let service = server.service.clone();
    Box::pin(async move {
        let payload = SettingsSnapshot::from(service.settings());
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                SETTINGS_URI,
                serialize_json(&payload, SETTINGS_URI),
            )],
        })
    })
}

fn resource_usage(
    _server: &PdfSumMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    Box::pin(async move {
        let usage = serde_json::json!({
            "title": "PDF Summarizer MCP Usage",
            "policy": [
                "Pass a filesystem path; do not paste PDF contents into prompts.",
                "Only files ending in .pdf are accepted.",
                "Set persist=true to keep the PDF and reuse its summary later.",
                "Use force=true only when the summary must be regenerated.",
            ],
            "flows": [
                {
                    "name": "One-off summary",
                    "steps": ["summarize-pdf({ path, mode?, sentences? })"]
                },
                {
                    "name": "Library",
                    "steps": [
                        "summarize-pdf({ path, persist: true })",
                        "list-documents()",
                        "summarize-pdf({ path, persist: true, force? })"
                    ]
                }
            ]
        });
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                USAGE_URI,
                serialize_json(&usage, USAGE_URI),
            )],
        })
    })
}

fn tool_summarize_pdf(
    server: &PdfSumMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let service = server.service.clone();
    Box::pin(async move { handle_summarize_pdf(&service, request.arguments).await })
}

fn tool_list_documents(
    server: &PdfSumMcpServer,
    _request: CallToolRequestParam,
) -> registry::ToolFuture {
    let service = server.service.clone();
    Box::pin(async move { handle_list_documents(&service).await })
}

fn tool_list_models(
    server: &PdfSumMcpServer,
    _request: CallToolRequestParam,
) -> registry::ToolFuture {
    let service = server.service.clone();
    Box::pin(async move { handle_list_models(&service).await })
}

fn tool_metrics(server: &PdfSumMcpServer, _request: CallToolRequestParam) -> registry::ToolFuture {
    let service = server.service.clone();
    Box::pin(async move { handle_metrics(&service).await })
}

impl ServerHandler for PdfSumMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "pdfsum".to_string();
        implementation.title = Some("PDF Summarizer MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use this server to summarize local PDF files. Call summarize-pdf with a path; persist documents to reuse their summaries, and read mcp://settings to see the active provider and chunking mode.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let uri = request.uri.clone();
            if let Some(handler) = self.registry.resources.get(uri.as_str()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown resource URI: {uri}"),
                None,
            ))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.tools.get(request.name.as_ref()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ))
        }
    }
}

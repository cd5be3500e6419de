//! HTTP surface for the PDF summarizer.
//!
//! This module exposes a compact Axum router:
//!
//! - `PUT /documents/:filename` – Store a PDF (raw request body). Requires a storage backend.
//! - `GET /documents` – List stored PDFs and whether a summary is persisted for each.
//! - `POST /documents/:filename/summary` – Summarize a stored PDF, reusing earlier summaries
//!   unless `force` is set. Returns `{ filename, summary, cached, segments }`.
//! - `POST /summarize?filename=...` – Summarize the PDF in the request body without storing it.
//! - `GET /models` – Models offered by the configured provider.
//! - `GET /metrics` – Summarization counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! The HTTP surface shares the same pipeline with the MCP server and the CLI, so behavior is
//! identical across interfaces.

use crate::config::ChunkMode;
use crate::document::Document;
use crate::extraction::ExtractionError;
use crate::metrics::MetricsSnapshot;
use crate::processing::{SummaryApi, SummaryError, SummaryOptions, SummaryOutcome};
use crate::storage::StoredDocument;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Largest accepted PDF upload.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SummaryApi + 'static,
{
    Router::new()
        .route("/documents", get(list_documents::<S>))
        .route("/documents/:filename", put(upload_document::<S>))
        .route("/documents/:filename/summary", post(summarize_stored::<S>))
        .route("/summarize", post(summarize_upload::<S>))
        .route("/models", get(list_models::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

/// Success response for summary endpoints.
#[derive(Serialize)]
struct SummaryResponse {
    filename: String,
    summary: String,
    /// True when the summary was served from the cache or storage.
    cached: bool,
    /// Segments sent to the summarizer for this request.
    segments: usize,
}

impl From<SummaryOutcome> for SummaryResponse {
    fn from(outcome: SummaryOutcome) -> Self {
        Self {
            filename: outcome.filename,
            summary: outcome.summary,
            cached: outcome.cached,
            segments: outcome.segments,
        }
    }
}

/// Store the request body as a PDF under `filename`.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    Path(filename): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredDocument>), AppError>
where
    S: SummaryApi,
{
    let stored = service.upload(Document::new(filename, body)).await?;
    tracing::info!(document = %stored.filename, size = stored.size, "Upload request completed");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Response body for `GET /documents`.
#[derive(Serialize)]
struct DocumentsResponse {
    documents: Vec<StoredDocument>,
}

/// List stored PDFs.
async fn list_documents<S>(
    State(service): State<Arc<S>>,
) -> Result<Json<DocumentsResponse>, AppError>
where
    S: SummaryApi,
{
    let documents = service.list_documents().await?;
    Ok(Json(DocumentsResponse { documents }))
}

/// Request body for `POST /documents/:filename/summary`.
#[derive(Deserialize, Default)]
struct StoredSummaryRequest {
    /// Regenerate even when a summary exists.
    #[serde(default)]
    force: bool,
    /// Chunk mode override (`full` | `per_page` | `semantic`).
    #[serde(default)]
    mode: Option<String>,
    /// Extractive sentence count override.
    #[serde(default)]
    sentences: Option<usize>,
}

/// Summarize a stored PDF. The JSON body is optional.
async fn summarize_stored<S>(
    State(service): State<Arc<S>>,
    Path(filename): Path<String>,
    request: Option<Json<StoredSummaryRequest>>,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: SummaryApi,
{
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let options = SummaryOptions {
        mode: parse_mode(request.mode.as_deref())?,
        sentences: request.sentences,
        force: request.force,
    };
    let outcome = service.summarize_stored(&filename, options).await?;
    tracing::info!(
        document = %outcome.filename,
        cached = outcome.cached,
        segments = outcome.segments,
        "Summary request completed"
    );
    Ok(Json(outcome.into()))
}

/// Query parameters for `POST /summarize`.
#[derive(Deserialize)]
struct UploadSummaryQuery {
    filename: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    sentences: Option<usize>,
}

/// Summarize the PDF carried in the request body without persisting it.
async fn summarize_upload<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<UploadSummaryQuery>,
    body: Bytes,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: SummaryApi,
{
    let options = SummaryOptions {
        mode: parse_mode(query.mode.as_deref())?,
        sentences: query.sentences,
        force: false,
    };
    let outcome = service
        .summarize_upload(Document::new(query.filename, body), options)
        .await?;
    tracing::info!(
        document = %outcome.filename,
        segments = outcome.segments,
        input_chars = outcome.input_chars,
        "Transient summary request completed"
    );
    Ok(Json(outcome.into()))
}

/// Response body for `GET /models`.
#[derive(Serialize)]
struct ModelsResponse {
    models: Vec<String>,
}

/// List models offered by the configured provider.
async fn list_models<S>(State(service): State<Arc<S>>) -> Result<Json<ModelsResponse>, AppError>
where
    S: SummaryApi,
{
    let models = service.list_models().await?;
    Ok(Json(ModelsResponse { models }))
}

/// Return the summarization counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: SummaryApi,
{
    Json(service.metrics_snapshot())
}

fn parse_mode(raw: Option<&str>) -> Result<Option<ChunkMode>, AppError> {
    raw.map(|value| {
        value
            .parse::<ChunkMode>()
            .map_err(|()| AppError::BadRequest(format!("unknown chunk mode '{value}'")))
    })
    .transpose()
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload_document",
                method: "PUT",
                path: "/documents/:filename",
                description: "Store the raw PDF request body under a *.pdf filename. Replacing a document discards its summary.",
                request_example: None,
            },
            CommandDescriptor {
                name: "list_documents",
                method: "GET",
                path: "/documents",
                description: "Return stored PDFs sorted by name with size and summary presence.",
                request_example: None,
            },
            CommandDescriptor {
                name: "summarize_document",
                method: "POST",
                path: "/documents/:filename/summary",
                description: "Summarize a stored PDF. Earlier summaries are reused unless force is true. Response returns { \"filename\", \"summary\", \"cached\", \"segments\" }.",
                request_example: Some(json!({
                    "force": false,
                    "mode": "per_page",
                    "sentences": 5
                })),
            },
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summarize?filename=report.pdf",
                description: "Extract and summarize the PDF in the request body without storing it.",
                request_example: None,
            },
            CommandDescriptor {
                name: "models",
                method: "GET",
                path: "/models",
                description: "List models offered by the configured summarization provider.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summarization counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    BadRequest(String),
    Summary(SummaryError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Summary(error) => match error {
                SummaryError::InvalidFilename(_) => StatusCode::BAD_REQUEST,
                SummaryError::NotFound(_) => StatusCode::NOT_FOUND,
                SummaryError::StorageDisabled => StatusCode::SERVICE_UNAVAILABLE,
                SummaryError::Extraction(ExtractionError::Task(_)) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                SummaryError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SummaryError::Summarizer(_) => StatusCode::BAD_GATEWAY,
                SummaryError::Chunking(_) | SummaryError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(message) => message.clone(),
            Self::Summary(error) => error.user_message(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %message, "Request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<SummaryError> for AppError {
    fn from(inner: SummaryError) -> Self {
        Self::Summary(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::config::ChunkMode;
    use crate::document::Document;
    use crate::extraction::ExtractionError;
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{
        PipelineSettings, SummaryApi, SummaryError, SummaryOptions, SummaryOutcome,
    };
    use crate::processing::types::{NO_TEXT_MESSAGE, RATE_LIMIT_MESSAGE};
    use crate::storage::StoredDocument;
    use crate::summarization::SummarizationClientError;
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[tokio::test]
    async fn commands_catalog_exposes_summary_endpoints() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let summarize = commands
            .iter()
            .find(|cmd| cmd.name == "summarize_document")
            .expect("summarize command present");

        assert_eq!(summarize.method, "POST");
        assert_eq!(summarize.path, "/documents/:filename/summary");
        assert!(summarize.description.to_lowercase().contains("force"));
        assert!(commands.len() >= 5);
    }

    #[tokio::test]
    async fn transient_summary_passes_query_options() {
        let service = Arc::new(StubSummaryService::default());
        let app = create_router(service.clone());

        let (status, body) = send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri("/summarize?filename=report.pdf&mode=per-page&sentences=2")
                .body(Body::from(&b"%PDF-1.5 body"[..]))
                .expect("request"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "report.pdf");
        assert_eq!(body["summary"], "stub summary");
        assert_eq!(body["cached"], false);
        assert_eq!(body["segments"], 1);

        let calls = service.recorded_calls().await;
        assert_eq!(
            calls,
            vec![Call::SummarizeUpload {
                filename: "report.pdf".into(),
                size: 13,
                mode: Some(ChunkMode::PerPage),
                sentences: Some(2),
            }]
        );
    }

    #[tokio::test]
    async fn stored_summary_accepts_missing_body() {
        let service = Arc::new(StubSummaryService::default());
        let app = create_router(service.clone());

        let (status, _) = send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri("/documents/report.pdf/summary")
                .body(Body::empty())
                .expect("request"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            service.recorded_calls().await,
            vec![Call::SummarizeStored {
                filename: "report.pdf".into(),
                force: false,
            }]
        );
    }

    #[tokio::test]
    async fn stored_summary_honors_force_flag() {
        let service = Arc::new(StubSummaryService::default());
        let app = create_router(service.clone());

        let (status, _) = send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri("/documents/report.pdf/summary")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "force": true }).to_string()))
                .expect("request"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            service.recorded_calls().await,
            vec![Call::SummarizeStored {
                filename: "report.pdf".into(),
                force: true,
            }]
        );
    }

    #[tokio::test]
    async fn upload_returns_created_document() {
        let service = Arc::new(StubSummaryService::default());
        let app = create_router(service.clone());

        let (status, body) = send(
            app,
            Request::builder()
                .method(Method::PUT)
                .uri("/documents/scan.pdf")
                .body(Body::from(vec![0u8; 42]))
                .expect("request"),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["filename"], "scan.pdf");
        assert_eq!(body["size"], 42);
        assert_eq!(body["has_summary"], false);
    }

    #[tokio::test]
    async fn unknown_mode_is_rejected_before_the_service() {
        let service = Arc::new(StubSummaryService::default());
        let app = create_router(service.clone());

        let (status, body) = send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri("/summarize?filename=a.pdf&mode=chapters")
                .body(Body::from("x"))
                .expect("request"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap_or_default().contains("chapters"));
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn service_errors_map_to_status_codes() {
        let cases: Vec<(fn() -> SummaryError, StatusCode, Option<&str>)> = vec![
            (
                || SummaryError::Extraction(ExtractionError::NoText),
                StatusCode::UNPROCESSABLE_ENTITY,
                Some(NO_TEXT_MESSAGE),
            ),
            (
                || {
                    SummaryError::Summarizer(SummarizationClientError::RateLimited(
                        "429".into(),
                    ))
                },
                StatusCode::BAD_GATEWAY,
                Some(RATE_LIMIT_MESSAGE),
            ),
            (
                || SummaryError::InvalidFilename("notes.txt".into()),
                StatusCode::BAD_REQUEST,
                None,
            ),
            (
                || SummaryError::NotFound("a.pdf".into()),
                StatusCode::NOT_FOUND,
                None,
            ),
            (
                || SummaryError::StorageDisabled,
                StatusCode::SERVICE_UNAVAILABLE,
                None,
            ),
        ];

        for (make_error, expected_status, expected_message) in cases {
            let service = Arc::new(StubSummaryService {
                fail_with: Some(make_error),
                ..StubSummaryService::default()
            });
            let (status, body) = send(
                create_router(service),
                Request::builder()
                    .method(Method::POST)
                    .uri("/summarize?filename=a.pdf")
                    .body(Body::from("x"))
                    .expect("request"),
            )
            .await;

            assert_eq!(status, expected_status);
            if let Some(message) = expected_message {
                assert_eq!(body["error"], message);
            }
        }
    }

    #[tokio::test]
    async fn documents_and_models_are_listed() {
        let service = Arc::new(StubSummaryService::default());

        let (status, body) = send(
            create_router(service.clone()),
            Request::builder()
                .uri("/documents")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["documents"][0]["filename"], "a.pdf");
        assert_eq!(body["documents"][0]["has_summary"], true);

        let (status, body) = send(
            create_router(service),
            Request::builder()
                .uri("/models")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["models"], json!(["lexrank", "lead"]));
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("router response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Upload {
            filename: String,
            size: usize,
        },
        SummarizeUpload {
            filename: String,
            size: usize,
            mode: Option<ChunkMode>,
            sentences: Option<usize>,
        },
        SummarizeStored {
            filename: String,
            force: bool,
        },
    }

    #[derive(Default)]
    struct StubSummaryService {
        calls: Arc<Mutex<Vec<Call>>>,
        fail_with: Option<fn() -> SummaryError>,
    }

    impl StubSummaryService {
        async fn recorded_calls(&self) -> Vec<Call> {
            self.calls.lock().await.clone()
        }

        fn outcome(&self, filename: &str) -> Result<SummaryOutcome, SummaryError> {
            if let Some(make_error) = self.fail_with {
                return Err(make_error());
            }
            Ok(SummaryOutcome {
                filename: filename.to_string(),
                summary: "stub summary".into(),
                cached: false,
                segments: 1,
                provider: "stub".into(),
                input_chars: 12,
            })
        }
    }

    #[async_trait]
    impl SummaryApi for StubSummaryService {
        async fn summarize_upload(
            &self,
            document: Document,
            options: SummaryOptions,
        ) -> Result<SummaryOutcome, SummaryError> {
            self.calls.lock().await.push(Call::SummarizeUpload {
                filename: document.filename.clone(),
                size: document.bytes.len(),
                mode: options.mode,
                sentences: options.sentences,
            });
            self.outcome(&document.filename)
        }

        async fn upload(&self, document: Document) -> Result<StoredDocument, SummaryError> {
            self.calls.lock().await.push(Call::Upload {
                filename: document.filename.clone(),
                size: document.bytes.len(),
            });
            Ok(StoredDocument {
                filename: document.filename,
                size: document.bytes.len() as u64,
                has_summary: false,
            })
        }

        async fn summarize_stored(
            &self,
            filename: &str,
            options: SummaryOptions,
        ) -> Result<SummaryOutcome, SummaryError> {
            self.calls.lock().await.push(Call::SummarizeStored {
                filename: filename.to_string(),
                force: options.force,
            });
            self.outcome(filename)
        }

        async fn list_documents(&self) -> Result<Vec<StoredDocument>, SummaryError> {
            Ok(vec![StoredDocument {
                filename: "a.pdf".into(),
                size: 10,
                has_summary: true,
            }])
        }

        async fn list_models(&self) -> Result<Vec<String>, SummaryError> {
            Ok(vec!["lexrank".into(), "lead".into()])
        }

        fn settings(&self) -> PipelineSettings {
            PipelineSettings::from_config(&crate::config::Config::default())
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot::default()
        }
    }
}

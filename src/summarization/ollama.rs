//! Ollama adapter (`/api/generate`, `/api/tags`).

use super::{
    MAX_OUTPUT_TOKENS, SummarizationClient, SummarizationClientError, SummarizationRequest,
    TEMPERATURE, http_client, send_json,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_MODEL: &str = "llama3.2";

/// Summarizes through a local Ollama runtime.
pub struct OllamaSummarizationClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaSummarizationClient {
    /// Create a client for the given runtime URL and model.
    pub fn new(
        base_url: Option<String>,
        model: Option<String>,
    ) -> Result<Self, SummarizationClientError> {
        Ok(Self {
            http: http_client("pdfsum/ollama")?,
            base_url: base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[async_trait]
impl SummarizationClient for OllamaSummarizationClient {
    fn provider(&self) -> &'static str {
        "ollama"
    }

    async fn generate_summary(
        &self,
        request: &SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "model": self.model,
            "prompt": request.prompt(),
            "stream": false,
            "options": {
                "temperature": TEMPERATURE,
                "num_predict": MAX_OUTPUT_TOKENS,
            }
        });

        let body: OllamaResponse =
            send_json("Ollama", self.http.post(self.endpoint("generate")).json(&payload)).await?;

        if !body.done {
            return Err(SummarizationClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }

    async fn list_models(&self) -> Result<Vec<String>, SummarizationClientError> {
        let tags: OllamaTags = send_json("Ollama", self.http.get(self.endpoint("tags"))).await?;
        Ok(tags.models.into_iter().map(|model| model.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };

    fn request() -> SummarizationRequest {
        SummarizationRequest {
            text: "Long text".into(),
            max_lines: 3,
            sentences: 5,
        }
    }

    fn client(server: &MockServer) -> OllamaSummarizationClient {
        OllamaSummarizationClient::new(Some(server.base_url()), Some("llama".into()))
            .expect("client")
    }

    #[tokio::test]
    async fn handles_successful_response() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .body_contains("\"model\":\"llama\"");
                then.status(200).json_body(json!({
                    "response": " Summary text ",
                    "done": true
                }));
            })
            .await;

        let summary = client(&server)
            .generate_summary(&request())
            .await
            .expect("summary");

        mock.assert();
        assert_eq!(summary, "Summary text");
    }

    #[tokio::test]
    async fn handles_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = client(&server)
            .generate_summary(&request())
            .await
            .expect_err("error response");

        assert!(
            matches!(error, SummarizationClientError::GenerationFailed(message) if message.contains("500"))
        );
    }

    #[tokio::test]
    async fn lists_local_models() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tags");
                then.status(200).json_body(json!({
                    "models": [{ "name": "llama3.2:latest" }, { "name": "qwen2.5:7b" }]
                }));
            })
            .await;

        let models = client(&server).list_models().await.expect("models");
        assert_eq!(models, vec!["llama3.2:latest", "qwen2.5:7b"]);
    }
}

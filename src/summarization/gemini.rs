//! Google Generative Language (Gemini) adapter.

use super::{
    MAX_OUTPUT_TOKENS, SummarizationClient, SummarizationClientError, SummarizationRequest,
    TEMPERATURE, http_client, send_json,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Summarizes with `models/{model}:generateContent`.
pub struct GeminiSummarizationClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiSummarizationClient {
    /// Create a client authenticated with `api_key`.
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Result<Self, SummarizationClientError> {
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self {
            http: http_client("pdfsum/gemini")?,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: strip_models_prefix(&model).to_string(),
        })
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn strip_models_prefix(name: &str) -> &str {
    name.strip_prefix("models/").unwrap_or(name)
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[async_trait]
impl SummarizationClient for GeminiSummarizationClient {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    async fn generate_summary(
        &self,
        request: &SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt() }] }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            }
        });
        let url = format!("{}/models/{}:generateContent", self.base(), self.model);

        let response: GenerateContentResponse = send_json(
            "Gemini",
            self.http
                .post(url)
                .header(API_KEY_HEADER, &self.api_key)
                .json(&payload),
        )
        .await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(SummarizationClientError::InvalidResponse(
                "Gemini returned no candidate text".into(),
            ));
        }
        Ok(text.to_string())
    }

    async fn list_models(&self) -> Result<Vec<String>, SummarizationClientError> {
        let url = format!("{}/models", self.base());
        let models: ModelList = send_json(
            "Gemini",
            self.http.get(url).header(API_KEY_HEADER, &self.api_key),
        )
        .await?;

        Ok(models
            .models
            .into_iter()
            .filter(|model| {
                model.supported_generation_methods.is_empty()
                    || model
                        .supported_generation_methods
                        .iter()
                        .any(|method| method == "generateContent")
            })
            .map(|model| strip_models_prefix(&model.name).to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };

    fn client(server: &MockServer, model: &str) -> GeminiSummarizationClient {
        GeminiSummarizationClient::new(
            "g-key".into(),
            Some(server.url("/v1beta")),
            Some(model.into()),
        )
        .expect("client")
    }

    fn request() -> SummarizationRequest {
        SummarizationRequest {
            text: "Report body".into(),
            max_lines: 2,
            sentences: 5,
        }
    }

    #[tokio::test]
    async fn joins_candidate_parts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-pro:generateContent")
                    .header("x-goog-api-key", "g-key")
                    .body_contains("at most 2 lines");
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": { "parts": [{ "text": "First half. " }, { "text": "Second half." }] }
                    }]
                }));
            })
            .await;

        let summary = client(&server, "models/gemini-pro")
            .generate_summary(&request())
            .await
            .expect("summary");
        mock.assert();
        assert_eq!(summary, "First half. Second half.");
    }

    #[tokio::test]
    async fn quota_exhaustion_is_rate_limited() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-pro:generateContent");
                then.status(429)
                    .json_body(json!({ "error": { "status": "RESOURCE_EXHAUSTED" } }));
            })
            .await;

        let error = client(&server, "gemini-pro")
            .generate_summary(&request())
            .await
            .expect_err("rate limited");
        assert!(error.is_rate_limited());
    }

    #[tokio::test]
    async fn missing_candidates_are_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-pro:generateContent");
                then.status(200).json_body(json!({ "candidates": [] }));
            })
            .await;

        let error = client(&server, "gemini-pro")
            .generate_summary(&request())
            .await
            .expect_err("malformed");
        assert!(matches!(error, SummarizationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn lists_generate_content_models_only() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1beta/models");
                then.status(200).json_body(json!({
                    "models": [
                        { "name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent", "countTokens"] },
                        { "name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"] }
                    ]
                }));
            })
            .await;

        let models = client(&server, "gemini-pro")
            .list_models()
            .await
            .expect("models");
        assert_eq!(models, vec!["gemini-1.5-flash"]);
    }
}

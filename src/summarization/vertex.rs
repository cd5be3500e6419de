//! Vertex AI text model adapter (`publishers/google/models/{model}:predict`).

use super::{
    MAX_OUTPUT_TOKENS, SummarizationClient, SummarizationClientError, SummarizationRequest,
    TEMPERATURE, http_client, send_json,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_MODEL: &str = "text-bison";

/// Summarizes with a Vertex AI publisher model using a bearer access token.
pub struct VertexSummarizationClient {
    http: Client,
    project_id: String,
    location: String,
    access_token: String,
    base_url: String,
    model: String,
}

impl VertexSummarizationClient {
    /// Create a client for `project_id` in `location`.
    pub fn new(
        project_id: String,
        location: String,
        access_token: String,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Result<Self, SummarizationClientError> {
        let base_url =
            base_url.unwrap_or_else(|| format!("https://{location}-aiplatform.googleapis.com/v1"));
        Ok(Self {
            http: http_client("pdfsum/vertex")?,
            project_id,
            location,
            access_token,
            base_url,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    fn predict_url(&self) -> String {
        format!(
            "{}/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            self.location,
            self.model
        )
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl SummarizationClient for VertexSummarizationClient {
    fn provider(&self) -> &'static str {
        "vertex"
    }

    async fn generate_summary(
        &self,
        request: &SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "instances": [{ "content": request.prompt() }],
            "parameters": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            }
        });

        let response: PredictResponse = send_json(
            "Vertex AI",
            self.http
                .post(self.predict_url())
                .bearer_auth(&self.access_token)
                .json(&payload),
        )
        .await?;

        response
            .predictions
            .into_iter()
            .next()
            .and_then(|prediction| prediction.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                SummarizationClientError::InvalidResponse(
                    "Vertex AI returned no prediction content".into(),
                )
            })
    }

    /// Vertex does not expose a cheap per-project listing for publisher models, so the
    /// configured model is reported.
    async fn list_models(&self) -> Result<Vec<String>, SummarizationClientError> {
        Ok(vec![self.model.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    const PREDICT_PATH: &str =
        "/v1/projects/demo/locations/europe-west1/publishers/google/models/text-bison:predict";

    fn client(server: &MockServer) -> VertexSummarizationClient {
        VertexSummarizationClient::new(
            "demo".into(),
            "europe-west1".into(),
            "ya29.token".into(),
            Some(server.url("/v1")),
            None,
        )
        .expect("client")
    }

    fn request() -> SummarizationRequest {
        SummarizationRequest {
            text: "Contract terms".into(),
            max_lines: 3,
            sentences: 5,
        }
    }

    #[test]
    fn default_endpoint_is_regional() {
        let client = VertexSummarizationClient::new(
            "demo".into(),
            "us-central1".into(),
            "token".into(),
            None,
            Some("gemini-1.0-pro".into()),
        )
        .expect("client");
        assert_eq!(
            client.predict_url(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/demo/locations/us-central1/publishers/google/models/gemini-1.0-pro:predict"
        );
    }

    #[tokio::test]
    async fn reads_first_prediction() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(PREDICT_PATH)
                    .header("authorization", "Bearer ya29.token")
                    .body_contains("\"maxOutputTokens\":256");
                then.status(200)
                    .json_body(json!({ "predictions": [{ "content": " Terms summarized. " }] }));
            })
            .await;

        let summary = client(&server)
            .generate_summary(&request())
            .await
            .expect("summary");
        mock.assert();
        assert_eq!(summary, "Terms summarized.");
    }

    #[tokio::test]
    async fn rate_limit_is_reported_distinctly() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PREDICT_PATH);
                then.status(429).body("Quota exceeded");
            })
            .await;

        let error = client(&server)
            .generate_summary(&request())
            .await
            .expect_err("rate limited");
        assert!(error.is_rate_limited());
    }

    #[tokio::test]
    async fn lists_configured_model() {
        let server = MockServer::start_async().await;
        let models = client(&server).list_models().await.expect("models");
        assert_eq!(models, vec!["text-bison"]);
    }
}

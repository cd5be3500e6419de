//! OpenAI chat completions adapter.

use super::{
    MAX_OUTPUT_TOKENS, SummarizationClient, SummarizationClientError, SummarizationRequest,
    TEMPERATURE, http_client, send_json,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Summarizes with the OpenAI chat completions API.
pub struct OpenAiSummarizationClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiSummarizationClient {
    /// Create a client authenticated with `api_key`.
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Result<Self, SummarizationClientError> {
        Ok(Self {
            http: http_client("pdfsum/openai")?,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[async_trait]
impl SummarizationClient for OpenAiSummarizationClient {
    fn provider(&self) -> &'static str {
        "openai"
    }

    async fn generate_summary(
        &self,
        request: &SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": "You write short, factual summaries of documents." },
                { "role": "user", "content": request.prompt() }
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_OUTPUT_TOKENS,
        });

        let completion: ChatCompletion = send_json(
            "OpenAI",
            self.http
                .post(self.endpoint("chat/completions"))
                .bearer_auth(&self.api_key)
                .json(&payload),
        )
        .await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                SummarizationClientError::InvalidResponse("OpenAI returned no message content".into())
            })
    }

    async fn list_models(&self) -> Result<Vec<String>, SummarizationClientError> {
        let models: ModelList = send_json(
            "OpenAI",
            self.http
                .get(self.endpoint("models"))
                .bearer_auth(&self.api_key),
        )
        .await?;
        let mut ids: Vec<String> = models.data.into_iter().map(|model| model.id).collect();
        ids.sort();
        Ok(ids)
    }
}

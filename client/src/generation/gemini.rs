use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{compose_prompt, GenerationError, GenerationProvider, GenerationRequest};

/// Client for the Gemini generateContent API.
pub struct GeminiClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

/// Gemini request format.
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Gemini response format.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

impl GenerateContentResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let prompt = compose_prompt(&request);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        tracing::debug!(model = %self.model, "Sending generation request");

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateContentRequest {
                contents: vec![Content {
                    parts: vec![Part { text: prompt }],
                }],
            })
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Provider(format!("{}: {}", status, body)));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let text = parsed.text();
        if text.is_empty() {
            return Ok("No content generated.".to_string());
        }
        Ok(text)
    }
}

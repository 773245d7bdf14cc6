// Gemini advisory implementation
use crate::application::advisory_service::{AdvisoryError, AdvisoryService};
use crate::domain::advisory::{AdvisoryRequest, AdvisoryResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct GeminiAdvisory {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiAdvisory {
    pub fn new(endpoint: String, model: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
        }
    }

    fn build_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn build_body(request: &AdvisoryRequest) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": request.prompt() }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "statusSummary": { "type": "STRING" },
                        "anomalies": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "recommendations": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["statusSummary", "anomalies", "recommendations"]
                }
            }
        })
    }

    /// Pull the JSON answer out of the first candidate and decode it.
    fn parse_response(response: GenerateContentResponse) -> Result<AdvisoryResult, AdvisoryError> {
        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AdvisoryError::EmptyResponse);
        }

        let result: AdvisoryResult = serde_json::from_str(text.trim())?;
        if !result.is_well_formed() {
            return Err(AdvisoryError::MissingSummary);
        }
        Ok(result)
    }
}

fn transport(err: reqwest::Error) -> AdvisoryError {
    AdvisoryError::Transport(err.to_string())
}

#[async_trait]
impl AdvisoryService for GeminiAdvisory {
    async fn analyze(&self, request: &AdvisoryRequest) -> Result<AdvisoryResult, AdvisoryError> {
        tracing::debug!(
            "Requesting advisory from {} (avg temp {:.1})",
            self.model,
            request.recent_average_temperature
        );

        let response = self
            .client
            .post(self.build_url())
            .header("x-goog-api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&Self::build_body(request))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisoryError::Status { status, body });
        }

        let data = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(transport)?;
        Self::parse_response(data)
    }
}

//! OpenAI chat-completions extractor

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{parse_generated_tasks, ExtractorError, GeneratedTask, TaskExtractor};

/// OpenAI API endpoint
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Sampling temperature; low to keep the output close to the text
const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

/// Connection settings for [`OpenAiTaskExtractor`]
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }
}

/// Extracts tasks with an OpenAI chat model
pub struct OpenAiTaskExtractor {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiTaskExtractor {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

/// Builds the extraction prompt
///
/// The current time is included so relative deadlines resolve to absolute
/// timestamps.
pub fn build_prompt(text: &str, reference_time: DateTime<Utc>) -> String {
    format!(
        r#"You are a task extraction assistant. Extract concrete, actionable tasks from the text below.

Current time: {now}

Text:
{text}

Return a JSON array of the extracted tasks in this format:
[
  {{
    "title": "short task title",
    "description": "task details",
    "due_date": "deadline in ISO 8601 format, e.g. 2025-10-28T23:59:59Z, or null if none is stated"
  }}
]

Rules:
- Return an empty array [] when the text contains no tasks
- Convert relative deadlines ("tomorrow", "next week") into absolute timestamps
- due_date must be an ISO 8601 string or null
- Return only the JSON array, with no explanation"#,
        now = reference_time.format("%Y-%m-%d %H:%M:%S UTC"),
        text = text,
    )
}

#[async_trait]
impl TaskExtractor for OpenAiTaskExtractor {
    async fn extract(&self, text: &str, reference_time: DateTime<Utc>) -> Result<Vec<GeneratedTask>, ExtractorError> {
        let request = OpenAiRequest {
            model: self.config.model.clone(),
            messages: vec![OpenAiMessage {
                role: "user",
                content: build_prompt(text, reference_time),
            }],
            temperature: TEMPERATURE,
        };

        debug!(model = %self.config.model, text_len = text.len(), "Requesting task extraction");

        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractorError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExtractorError::Request(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<OpenAiErrorResponse>(&body)
                .map(|error_response| error_response.error.message)
                .unwrap_or(body);
            warn!(status = status.as_u16(), "OpenAI API returned an error");
            return Err(ExtractorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: OpenAiResponse =
            serde_json::from_str(&body).map_err(|e| ExtractorError::Parse(e.to_string()))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ExtractorError::EmptyResponse)?;

        parse_generated_tasks(&content)
    }
}

//! AI task extraction
//!
//! A [`TaskExtractor`] turns free text into task candidates. The task service
//! treats it as a black box: it supplies the text and the current time and
//! sanitizes whatever comes back before handing it to the caller.
//!
//! - [`openai`]: chat-completions backed extractor

pub mod openai;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use openai::{OpenAiConfig, OpenAiTaskExtractor};

/// One task proposed by the extractor
///
/// Never persisted by the extraction path; creating it is a separate call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTask {
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub due_date: Option<DateTime<Utc>>,
}

/// Error type for extraction backends
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// Transport failure talking to the backend
    #[error("AI request failed: {0}")]
    Request(String),

    /// The backend answered with an error status
    #[error("AI API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend answered without any content
    #[error("no response from AI backend")]
    EmptyResponse,

    /// The content was not a task array
    #[error("failed to parse AI response: {0}")]
    Parse(String),

    /// The backend did not answer within the configured timeout
    #[error("AI request timed out after {0} seconds")]
    Timeout(u64),
}

/// Text-to-task extraction backend
#[async_trait]
pub trait TaskExtractor: Send + Sync {
    /// Extracts task candidates from `text`
    ///
    /// `reference_time` anchors relative phrases such as "tomorrow".
    async fn extract(&self, text: &str, reference_time: DateTime<Utc>) -> Result<Vec<GeneratedTask>, ExtractorError>;
}

/// Wire shape of one candidate before date normalization
#[derive(Debug, Deserialize)]
struct RawGeneratedTask {
    #[serde(default)]
    title: String,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    due_date: Option<String>,
}

/// Parses model output into candidates
///
/// Accepts a bare JSON array, optionally wrapped in a Markdown code fence.
/// Due dates are RFC 3339; a timestamp without offset is read as UTC and an
/// unparseable one is dropped.
pub fn parse_generated_tasks(content: &str) -> Result<Vec<GeneratedTask>, ExtractorError> {
    let json = strip_code_fence(content);
    let raw: Vec<RawGeneratedTask> =
        serde_json::from_str(json).map_err(|e| ExtractorError::Parse(format!("{e} (response: {content})")))?;

    Ok(raw
        .into_iter()
        .map(|task| GeneratedTask {
            title: task.title,
            description: task.description.unwrap_or_default(),
            due_date: task.due_date.as_deref().and_then(parse_due_date),
        })
        .collect())
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.strip_prefix("json").unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn parse_due_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

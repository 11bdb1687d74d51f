//! Sanitizing of extractor output

use chrono::{DateTime, Duration, Utc};

use super::error::{DomainError, DomainResult};
use crate::ai::GeneratedTask;

/// Upper bound on candidates accepted from one extraction
pub const MAX_GENERATED_TASKS: usize = 20;

/// Due dates further in the past than this are dropped
const STALE_DUE_DATE_HOURS: i64 = 24;

/// Filters raw candidates into tasks safe to show the caller
///
/// Blank titles are dropped, titles and descriptions are trimmed, and a due
/// date more than 24 hours before `now` is cleared.
///
/// # Errors
///
/// - `AiNoTasksGenerated` for empty input
/// - `TooManyGeneratedTasks` above [`MAX_GENERATED_TASKS`]
/// - `AiNoValidTasks` when every candidate was dropped
pub fn sanitize_generated_tasks(candidates: Vec<GeneratedTask>, now: DateTime<Utc>) -> DomainResult<Vec<GeneratedTask>> {
    if candidates.is_empty() {
        return Err(DomainError::AiNoTasksGenerated);
    }

    if candidates.len() > MAX_GENERATED_TASKS {
        return Err(DomainError::TooManyGeneratedTasks {
            max: MAX_GENERATED_TASKS,
            actual: candidates.len(),
        });
    }

    let stale_before = now - Duration::hours(STALE_DUE_DATE_HOURS);

    let valid: Vec<GeneratedTask> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let title = candidate.title.trim();
            if title.is_empty() {
                return None;
            }

            Some(GeneratedTask {
                title: title.to_string(),
                description: candidate.description.trim().to_string(),
                due_date: candidate.due_date.filter(|due| *due >= stale_before),
            })
        })
        .collect();

    if valid.is_empty() {
        return Err(DomainError::AiNoValidTasks);
    }

    Ok(valid)
}

//! Sanitizing and validating raw model output.
//!
//! The declared response schema is only advisory: the model may wrap JSON in
//! Markdown fences, invent enum values, or drop required fields. Everything
//! here turns that text into typed descriptors or a [`ResponseError`].

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::error::ResponseError;
use crate::logging::log_warn;
use crate::model::{Category, Deadline, PlanDescriptor, Priority, ScheduleItem, TaskDescriptor};

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").expect("valid regex"));
static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("valid regex"));

/// Remove a surrounding triple-backtick fence, with or without a language tag
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let without_open = match OPENING_FENCE.find(trimmed) {
        Some(m) => &trimmed[m.end()..],
        None => trimmed,
    };
    let without_close = match CLOSING_FENCE.find(without_open) {
        Some(m) => &without_open[..m.start()],
        None => without_open,
    };
    without_close.trim()
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
    tasks: Vec<RawTask>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTask {
    title: String,
    #[serde(default)]
    description: Option<String>,
    category: Category,
    priority: Priority,
    #[serde(default)]
    deadline: Option<String>,
    estimated_minutes: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlan {
    focus_of_the_day: String,
    schedule: Vec<RawScheduleItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScheduleItem {
    time: String,
    activity: String,
    #[serde(default)]
    task_id: Option<String>,
    duration_minutes: i64,
}

fn parse_json<'a, T: Deserialize<'a>>(raw: &'a str) -> Result<T, ResponseError> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(ResponseError::Empty);
    }
    Ok(serde_json::from_str(cleaned)?)
}

fn positive_minutes(field: String, value: i64) -> Result<u32, ResponseError> {
    if value <= 0 {
        return Err(ResponseError::invalid(field, format!("{value} is not a positive number of minutes")));
    }
    u32::try_from(value).map_err(|_| ResponseError::invalid(field, format!("{value} is out of range")))
}

fn non_empty(field: String, value: String) -> Result<String, ResponseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ResponseError::invalid(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Blank optional strings count as absent
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
}

pub fn parse_extraction(raw: &str) -> Result<Vec<TaskDescriptor>, ResponseError> {
    let extraction: RawExtraction = parse_json(raw)?;

    extraction
        .tasks
        .into_iter()
        .enumerate()
        .map(|(i, task)| -> Result<TaskDescriptor, ResponseError> {
            // an unreadable optional deadline is dropped, the task is kept
            let deadline = optional_text(task.deadline).and_then(|s| match s.parse::<Deadline>() {
                Ok(deadline) => Some(deadline),
                Err(reason) => {
                    log_warn(&format!("Dropping tasks[{i}].deadline: {reason}"));
                    None
                }
            });

            Ok(TaskDescriptor {
                title: non_empty(format!("tasks[{i}].title"), task.title)?,
                description: optional_text(task.description),
                category: task.category,
                priority: task.priority,
                deadline,
                estimated_minutes: positive_minutes(
                    format!("tasks[{i}].estimatedMinutes"),
                    task.estimated_minutes,
                )?,
            })
        })
        .collect()
}

pub fn parse_plan(raw: &str) -> Result<PlanDescriptor, ResponseError> {
    let plan: RawPlan = parse_json(raw)?;

    let schedule = plan
        .schedule
        .into_iter()
        .enumerate()
        .map(|(i, item)| -> Result<ScheduleItem, ResponseError> {
            Ok(ScheduleItem {
                time: non_empty(format!("schedule[{i}].time"), item.time)?,
                activity: non_empty(format!("schedule[{i}].activity"), item.activity)?,
                task_id: optional_text(item.task_id),
                duration_minutes: positive_minutes(
                    format!("schedule[{i}].durationMinutes"),
                    item.duration_minutes,
                )?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PlanDescriptor {
        focus_of_the_day: plan.focus_of_the_day.trim().to_string(),
        schedule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DENTIST: &str = r#"{"tasks":[{"title":"Book dentist","category":"Health","priority":"Medium","estimatedMinutes":30}]}"#;

    #[test]
    fn test_strip_fence_with_language_tag() {
        let fenced = format!("```json\n{DENTIST}\n```");
        assert_eq!(strip_code_fences(&fenced), DENTIST);
        assert_eq!(parse_extraction(&fenced).unwrap(), parse_extraction(DENTIST).unwrap());
    }

    #[test]
    fn test_strip_fence_without_language_tag() {
        let fenced = format!("  ```\n{DENTIST}```  ");
        assert_eq!(strip_code_fences(&fenced), DENTIST);
    }

    #[test]
    fn test_unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fences("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_extraction_minimal_task() {
        let tasks = parse_extraction(DENTIST).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Book dentist");
        assert_eq!(tasks[0].category, Category::Health);
        assert_eq!(tasks[0].priority, Priority::Medium);
        assert_eq!(tasks[0].estimated_minutes, 30);
        assert!(tasks[0].description.is_none());
        assert!(tasks[0].deadline.is_none());
    }

    #[test]
    fn test_parse_extraction_empty_list_is_valid() {
        assert!(parse_extraction(r#"{"tasks":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_extraction_null_and_blank_optionals() {
        let raw = r#"{"tasks":[{"title":"Pay rent","description":"","category":"Finance","priority":"High","deadline":null,"estimatedMinutes":10}]}"#;
        let tasks = parse_extraction(raw).unwrap();
        assert!(tasks[0].description.is_none());
        assert!(tasks[0].deadline.is_none());
    }

    #[test]
    fn test_parse_extraction_with_deadline() {
        let raw = r#"{"tasks":[{"title":"Pay rent","category":"Finance","priority":"High","deadline":"2025-03-01","estimatedMinutes":10}]}"#;
        let tasks = parse_extraction(raw).unwrap();
        assert_eq!(tasks[0].deadline.unwrap().to_string(), "2025-03-01");
    }

    #[test]
    fn test_unknown_enum_is_rejected() {
        let raw = r#"{"tasks":[{"title":"Nap","category":"Leisure","priority":"Low","estimatedMinutes":20}]}"#;
        assert!(matches!(parse_extraction(raw), Err(ResponseError::Json(_))));
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let raw = r#"{"tasks":[{"title":"Nap","category":"Other","estimatedMinutes":20}]}"#;
        let err = parse_extraction(raw).unwrap_err();
        assert!(err.to_string().contains("priority"));
    }

    #[test]
    fn test_missing_tasks_key_is_rejected() {
        assert!(parse_extraction("{}").is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let empty_title = r#"{"tasks":[{"title":"  ","category":"Other","priority":"Low","estimatedMinutes":20}]}"#;
        let zero_minutes = r#"{"tasks":[{"title":"Nap","category":"Other","priority":"Low","estimatedMinutes":0}]}"#;

        for raw in [empty_title, zero_minutes] {
            assert!(matches!(
                parse_extraction(raw),
                Err(ResponseError::InvalidField { .. })
            ));
        }
    }

    #[test]
    fn test_offset_deadline_keeps_whole_batch() {
        let raw = r#"{"tasks":[
  {"title":"Book dentist","category":"Health","priority":"Medium","estimatedMinutes":30},
  {"title":"Pay rent","category":"Finance","priority":"High","deadline":"2025-03-04T17:00:00+0000","estimatedMinutes":10}
]}"#;
        let tasks = parse_extraction(raw).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "Book dentist");
        assert_eq!(tasks[1].deadline.unwrap().to_string(), "2025-03-04T17:00");
    }

    #[test]
    fn test_unreadable_deadline_is_dropped() {
        let raw = r#"{"tasks":[
  {"title":"Book dentist","category":"Health","priority":"Medium","estimatedMinutes":30},
  {"title":"Nap","category":"Other","priority":"Low","deadline":"someday","estimatedMinutes":5}
]}"#;
        let tasks = parse_extraction(raw).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].title, "Nap");
        assert!(tasks[1].deadline.is_none());
    }

    #[test]
    fn test_empty_response() {
        assert!(matches!(parse_extraction("   "), Err(ResponseError::Empty)));
        assert!(matches!(parse_plan("```json\n```"), Err(ResponseError::Empty)));
    }

    #[test]
    fn test_parse_plan() {
        let raw = r#"```json
{"focusOfTheDay":"Finish the budget","schedule":[
  {"time":"09:00 AM","activity":"Review quarterly budget","taskId":"Review quarterly budget","durationMinutes":45},
  {"time":"09:45 AM","activity":"Break","taskId":null,"durationMinutes":15}
]}
```"#;
        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.focus_of_the_day, "Finish the budget");
        assert_eq!(plan.schedule.len(), 2);
        assert_eq!(plan.schedule[0].task_id.as_deref(), Some("Review quarterly budget"));
        assert!(plan.schedule[1].task_id.is_none());
        assert_eq!(plan.schedule[1].duration_minutes, 15);
    }

    #[test]
    fn test_parse_plan_rejects_negative_duration() {
        let raw = r#"{"focusOfTheDay":"x","schedule":[{"time":"9","activity":"a","durationMinutes":-5}]}"#;
        assert!(parse_plan(raw).is_err());
    }
}

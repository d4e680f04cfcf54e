//! Model gateway: turns extraction and planning requests into structured-output
//! calls and the replies into validated descriptors.
//!
//! Every failure of a call (transport, auth, empty text, schema violation)
//! collapses into one error kind per operation. There is no retry and no
//! partial result.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{Value, json};

use crate::audio::AudioClip;
use crate::constants::{AUDIO_MIME_TYPE, IMAGE_MIME_TYPE, PLAN_DAY_START};
use crate::error::OrganizerError;
use crate::image::ImageAttachment;
use crate::logging::{log_debug, log_error, log_info};
use crate::model::{Category, Deadline, PlanDescriptor, Priority, Task, TaskDescriptor};
use crate::provider::{AiProvider, ModelRequest, ProviderConfig, ProviderFactory, RequestPart};
use crate::response::{parse_extraction, parse_plan};

const IMAGE_INSTRUCTION: &str = "Extract all actionable tasks, events, and reminders from this image.";
const AUDIO_INSTRUCTION: &str = "Listen to this audio and extract all tasks, reminders, and notes.";

/// What one submission hands to the extraction model
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractionInput<'a> {
    pub text: Option<&'a str>,
    pub image: Option<&'a ImageAttachment>,
    pub audio: Option<&'a AudioClip>,
}

impl ExtractionInput<'_> {
    fn text(&self) -> Option<&str> {
        self.text.map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_none() && self.image.is_none() && self.audio.is_none()
    }
}

/// The subset of a task the planner sees
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanTaskSummary<'a> {
    title: &'a str,
    priority: Priority,
    category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimated_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deadline: Option<Deadline>,
}

fn string_enum(values: impl IntoIterator<Item = &'static str>) -> Value {
    json!({ "type": "string", "enum": values.into_iter().collect::<Vec<_>>() })
}

pub fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "tasks": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "category": string_enum(Category::ALL.iter().map(Category::as_str)),
                        "priority": string_enum(Priority::ALL.iter().map(Priority::as_str)),
                        "deadline": {
                            "type": "string",
                            "description": "ISO date string or null if none"
                        },
                        "estimatedMinutes": { "type": "integer" }
                    },
                    "required": ["title", "category", "priority", "estimatedMinutes"]
                }
            }
        },
        "required": ["tasks"]
    })
}

pub fn plan_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "focusOfTheDay": { "type": "string" },
            "schedule": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "time": {
                            "type": "string",
                            "description": "Time string e.g., 09:00 AM"
                        },
                        "activity": { "type": "string" },
                        "taskId": {
                            "type": "string",
                            "description": "The exact title of the task if applicable, or null"
                        },
                        "durationMinutes": { "type": "integer" }
                    },
                    "required": ["time", "activity", "durationMinutes"]
                }
            }
        },
        "required": ["focusOfTheDay", "schedule"]
    })
}

/// Parts in order: image + instruction, audio + instruction, quoted text, closing instruction
pub fn build_extraction_request(
    input: &ExtractionInput<'_>,
    today: NaiveDate,
) -> Result<ModelRequest, OrganizerError> {
    if input.is_empty() {
        return Err(OrganizerError::InvalidInput);
    }

    let mut parts = Vec::new();

    if let Some(image) = input.image {
        parts.push(RequestPart::InlineData {
            mime_type: IMAGE_MIME_TYPE.to_string(),
            data: image.to_base64(),
        });
        parts.push(RequestPart::text(IMAGE_INSTRUCTION));
    }

    if let Some(audio) = input.audio {
        parts.push(RequestPart::InlineData {
            mime_type: AUDIO_MIME_TYPE.to_string(),
            data: audio.to_base64(),
        });
        parts.push(RequestPart::text(AUDIO_INSTRUCTION));
    }

    if let Some(text) = input.text() {
        parts.push(RequestPart::text(format!("Analyze this request: \"{text}\"")));
    }

    parts.push(RequestPart::text(format!(
        "Today is {}. Return a JSON object with a list of tasks. \
         Infer category, priority, deadline, and estimated duration if not specified.",
        today.format("%A, %Y-%m-%d")
    )));

    Ok(ModelRequest {
        parts,
        schema_name: "task_extraction".to_string(),
        response_schema: extraction_schema(),
        thinking_budget: None,
    })
}

/// JSON array of `{title, priority, category, estimatedMinutes, deadline}`
pub fn serialize_plan_tasks(tasks: &[Task]) -> serde_json::Result<String> {
    let summaries: Vec<PlanTaskSummary<'_>> = tasks
        .iter()
        .map(|task| PlanTaskSummary {
            title: &task.title,
            priority: task.priority,
            category: task.category,
            estimated_minutes: task.estimated_minutes,
            deadline: task.deadline,
        })
        .collect();
    serde_json::to_string(&summaries)
}

pub fn build_plan_request(tasks: &[Task], thinking_budget: u32) -> Result<ModelRequest, OrganizerError> {
    let tasks_json =
        serialize_plan_tasks(tasks).map_err(|e| OrganizerError::PlanFailed(e.to_string()))?;

    let prompt = format!(
        "You are an expert productivity planner.\n\
         Here is my list of active tasks:\n\
         {tasks_json}\n\n\
         Please create a realistic, optimized daily schedule for today.\n\
         - Start the day no earlier than {PLAN_DAY_START}.\n\
         - Include breaks.\n\
         - Schedule High priority tasks first.\n\
         - Group tasks of the same category when it is efficient.\n\
         - Suggest a single \"Focus of the Day\".\n\
         When a schedule entry works on one of the tasks above, set taskId to that task's exact title."
    );

    Ok(ModelRequest {
        parts: vec![RequestPart::Text(prompt)],
        schema_name: "day_plan".to_string(),
        response_schema: plan_schema(),
        thinking_budget: Some(thinking_budget),
    })
}

#[derive(Debug)]
pub struct ModelGateway {
    extractor: Box<dyn AiProvider>,
    planner: Box<dyn AiProvider>,
    thinking_budget: u32,
}

impl ModelGateway {
    pub fn new(
        extractor: Box<dyn AiProvider>,
        planner: Box<dyn AiProvider>,
        thinking_budget: u32,
    ) -> Self {
        Self {
            extractor,
            planner,
            thinking_budget,
        }
    }

    /// Build both providers from model strings sharing one API key
    pub fn connect(
        extract_model: &str,
        plan_model: &str,
        api_key: String,
        thinking_budget: u32,
    ) -> Result<Self> {
        let extractor = ProviderFactory::create_provider(ProviderConfig {
            model: extract_model.to_string(),
            api_key: api_key.clone(),
        })
        .context("Failed to initialize extraction model")?;
        let planner = ProviderFactory::create_provider(ProviderConfig {
            model: plan_model.to_string(),
            api_key,
        })
        .context("Failed to initialize planning model")?;

        Ok(Self::new(extractor, planner, thinking_budget))
    }

    pub async fn extract_tasks(
        &self,
        input: &ExtractionInput<'_>,
    ) -> Result<Vec<TaskDescriptor>, OrganizerError> {
        let request = build_extraction_request(input, Local::now().date_naive())?;

        log_info(&format!(
            "Extracting tasks with {} {} ({} part(s))",
            self.extractor.provider_name(),
            self.extractor.model_name(),
            request.parts.len()
        ));

        let response = self
            .extractor
            .generate_content(request)
            .await
            .map_err(|e| {
                log_error(&format!("Extraction call failed: {e:#}"));
                OrganizerError::AnalysisFailed(format!("{e:#}"))
            })?;

        log_debug(&format!(
            "Extraction response ({} tokens): {}",
            response.usage.format_short(),
            response.content
        ));

        let tasks = parse_extraction(&response.content).map_err(|e| {
            log_error(&format!("Extraction response rejected: {e}"));
            OrganizerError::AnalysisFailed(e.to_string())
        })?;

        log_info(&format!("Model extracted {} task(s)", tasks.len()));
        Ok(tasks)
    }

    pub async fn generate_plan(&self, tasks: &[Task]) -> Result<PlanDescriptor, OrganizerError> {
        let request = build_plan_request(tasks, self.thinking_budget)?;

        log_info(&format!(
            "Planning {} task(s) with {} {} (thinking budget {})",
            tasks.len(),
            self.planner.provider_name(),
            self.planner.model_name(),
            self.thinking_budget
        ));

        let response = self
            .planner
            .generate_content(request)
            .await
            .map_err(|e| {
                log_error(&format!("Planning call failed: {e:#}"));
                OrganizerError::PlanFailed(format!("{e:#}"))
            })?;

        log_debug(&format!(
            "Planning response ({} tokens): {}",
            response.usage.format_short(),
            response.content
        ));

        let plan = parse_plan(&response.content).map_err(|e| {
            log_error(&format!("Planning response rejected: {e}"));
            OrganizerError::PlanFailed(e.to_string())
        })?;

        log_info(&format!("Model planned {} schedule item(s)", plan.schedule.len()));
        Ok(plan)
    }
}

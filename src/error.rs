//! Organizer error types

use thiserror::Error;

/// Failures surfaced by the capture and planning flows
#[derive(Debug, Error)]
pub enum OrganizerError {
    #[error("No text, image, or audio to analyze")]
    InvalidInput,

    #[error("Failed to analyze input: {0}")]
    AnalysisFailed(String),

    #[error("Failed to generate plan: {0}")]
    PlanFailed(String),

    #[error("No active tasks to plan")]
    NoActiveTasks,

    #[error("Could not access microphone: {0}")]
    DeviceAccess(String),
}

impl OrganizerError {
    /// Short notice shown to the user; causes stay in the log
    pub fn user_message(&self) -> &'static str {
        match self {
            OrganizerError::InvalidInput => "Nothing to analyze. Type a task, attach an image, or record audio.",
            OrganizerError::AnalysisFailed(_) => {
                "Something went wrong processing your input. Please try again."
            }
            OrganizerError::PlanFailed(_) => "Failed to generate plan. Please try again.",
            OrganizerError::NoActiveTasks => "No active tasks to plan! Add some tasks first.",
            OrganizerError::DeviceAccess(_) => {
                "Could not access microphone. Please ensure permissions are granted."
            }
        }
    }
}

/// Reasons a model response is rejected at the gateway boundary
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("Model returned an empty response")]
    Empty,

    #[error("Response is not valid JSON for the declared schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

impl ResponseError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ResponseError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

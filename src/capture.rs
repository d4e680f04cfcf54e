use chrono::Utc;
use std::path::Path;

use crate::audio::AudioClip;
use crate::error::OrganizerError;
use crate::gateway::{ExtractionInput, ModelGateway};
use crate::image::ImageAttachment;
use crate::logging::{log_debug, log_info, log_warn};
use crate::model::Task;
use crate::state::{Action, OrganizerState};

pub const ANALYZING_STEP: &str = "Analyzing your input with Gemini...";

/// Text and image staged for the next submission
#[derive(Debug, Default)]
pub struct InputCapture {
    text: String,
    image: Option<ImageAttachment>,
}

impl InputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attach_image(&mut self, path: &Path) -> anyhow::Result<&ImageAttachment> {
        let image = ImageAttachment::from_path(path)?;
        log_info(&format!("Staged image: {} bytes", image.len()));
        Ok(self.image.insert(image))
    }

    #[cfg(test)]
    pub fn stage_image(&mut self, image: ImageAttachment) {
        self.image = Some(image);
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub fn clear_image(&mut self) -> bool {
        self.image.take().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.image.is_none()
    }

    /// Send the staged input plus an optional recording to the extraction model.
    ///
    /// The recording is consumed whatever the outcome. Staged text and image
    /// are cleared only on success so the user can retry a failed submission.
    /// Returns how many tasks were added.
    pub async fn submit(
        &mut self,
        gateway: &ModelGateway,
        state: &mut OrganizerState,
        audio: Option<AudioClip>,
    ) -> Result<usize, OrganizerError> {
        let input = ExtractionInput {
            text: Some(self.text.as_str()),
            image: self.image.as_ref(),
            audio: audio.as_ref(),
        };

        if input.is_empty() {
            log_debug("Ignoring empty submission");
            return Err(OrganizerError::InvalidInput);
        }

        state.apply(Action::Begin {
            step: ANALYZING_STEP.to_string(),
        });

        match gateway.extract_tasks(&input).await {
            Ok(descriptors) => {
                let now = Utc::now();
                let tasks: Vec<Task> = descriptors
                    .into_iter()
                    .map(|descriptor| Task::from_descriptor(descriptor, now))
                    .collect();
                let added = tasks.len();

                state.apply(Action::TasksExtracted(tasks));
                self.text.clear();
                self.image = None;
                log_info(&format!("Added {added} task(s)"));
                Ok(added)
            }
            Err(e) => {
                log_warn(&format!("Submission failed: {e}"));
                state.apply(Action::Failed(e.user_message().to_string()));
                Err(e)
            }
        }
    }
}

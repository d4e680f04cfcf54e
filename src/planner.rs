use chrono::Utc;

use crate::error::OrganizerError;
use crate::gateway::ModelGateway;
use crate::logging::{log_debug, log_info, log_warn};
use crate::model::DayPlan;
use crate::state::{Action, OrganizerState};

pub const PLANNING_STEP: &str = "Analyzing tasks & priorities...";

/// Build a fresh plan from the incomplete tasks, replacing any previous one.
///
/// Nothing is sent and the state is untouched when there is no incomplete
/// task or another call is in flight. On failure the previous plan stays.
pub async fn regenerate_plan(
    gateway: &ModelGateway,
    state: &mut OrganizerState,
) -> Result<(), OrganizerError> {
    if state.loading {
        log_debug("Plan requested while busy, ignoring");
        return Ok(());
    }

    let active = state.tasks.incomplete();
    if active.is_empty() {
        return Err(OrganizerError::NoActiveTasks);
    }

    state.apply(Action::Begin {
        step: PLANNING_STEP.to_string(),
    });

    match gateway.generate_plan(&active).await {
        Ok(descriptor) => {
            let plan = DayPlan::from_descriptor(descriptor, Utc::now());
            log_info(&format!(
                "New plan with {} item(s), focus: {}",
                plan.schedule.len(),
                plan.focus_of_the_day
            ));
            state.apply(Action::PlanGenerated(plan));
            Ok(())
        }
        Err(e) => {
            log_warn(&format!("Plan generation failed: {e}"));
            state.apply(Action::Failed(e.user_message().to_string()));
            Err(e)
        }
    }
}

//! Organizer state container and its transition function.
//!
//! Every mutation goes through [`reduce`], which takes the previous state and
//! an [`Action`] and returns the next state. Ids and timestamps are produced
//! before an action is built, so `reduce` itself stays deterministic.

use crate::model::{DayPlan, Task, TaskId};
use crate::store::TaskStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizerState {
    pub tasks: TaskStore,
    pub plan: Option<DayPlan>,
    pub loading: bool,
    pub processing_step: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A model call is about to be issued
    Begin { step: String },
    TasksExtracted(Vec<Task>),
    ToggleComplete(TaskId),
    DeleteTask(TaskId),
    PlanGenerated(DayPlan),
    /// A model call failed; the notice is shown to the user
    Failed(String),
    DismissError,
}

impl OrganizerState {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: TaskStore::new(tasks),
            ..Self::default()
        }
    }

    /// Replace `self` with `reduce(self, action)`
    pub fn apply(&mut self, action: Action) {
        *self = reduce(std::mem::take(self), action);
    }
}

pub fn reduce(mut state: OrganizerState, action: Action) -> OrganizerState {
    match action {
        Action::Begin { step } => {
            state.loading = true;
            state.processing_step = Some(step);
        }
        Action::TasksExtracted(tasks) => {
            state.tasks.add_all(tasks);
            state.loading = false;
            state.processing_step = None;
        }
        Action::ToggleComplete(id) => {
            state.tasks.toggle_complete(id);
        }
        Action::DeleteTask(id) => {
            state.tasks.delete(id);
        }
        Action::PlanGenerated(plan) => {
            state.plan = Some(plan);
            state.loading = false;
            state.processing_step = None;
        }
        Action::Failed(message) => {
            // loading is cleared before the notice becomes visible
            state.loading = false;
            state.processing_step = None;
            state.error = Some(message);
        }
        Action::DismissError => {
            state.error = None;
        }
    }
    state
}

use uuid::Uuid;

use crate::logging::{log_debug, log_warn};
use crate::model::{Task, TaskId};

/// Ordered in-memory task list, most recently added first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut store = Self::default();
        store.add_all(tasks);
        store
    }

    /// Prepend `new_tasks` as one block, keeping their relative order.
    /// Ids that already exist are re-keyed so ids stay unique.
    pub fn add_all(&mut self, mut new_tasks: Vec<Task>) -> usize {
        for i in 0..new_tasks.len() {
            while self.contains(new_tasks[i].id)
                || new_tasks[..i].iter().any(|t| t.id == new_tasks[i].id)
            {
                log_warn(&format!(
                    "Task id {} already in use, assigning a new one",
                    new_tasks[i].id
                ));
                new_tasks[i].id = Uuid::new_v4();
            }
        }

        let added = new_tasks.len();
        new_tasks.append(&mut self.tasks);
        self.tasks = new_tasks;
        log_debug(&format!(
            "Added {added} task(s), store now holds {}",
            self.tasks.len()
        ));
        added
    }

    /// Flip completion; returns the new value, or `None` when the id is unknown
    pub fn toggle_complete(&mut self, id: TaskId) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.completed = !task.completed;
        Some(task.completed)
    }

    /// Remove the task with `id`, returning it if it was present
    pub fn delete(&mut self, id: TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(index))
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    #[cfg(test)]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Id of the task shown at 1-based `position` in the list
    pub fn id_at(&self, position: usize) -> Option<TaskId> {
        position
            .checked_sub(1)
            .and_then(|i| self.tasks.get(i))
            .map(|t| t.id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn incomplete(&self) -> Vec<Task> {
        self.tasks.iter().filter(|t| !t.completed).cloned().collect()
    }

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.len() - self.active_count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

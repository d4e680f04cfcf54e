//! Task and plan domain model.
//!
//! # Invariants
//! - `Task::id` is generated once and never reassigned by user action.
//! - `Task::completed` is the only field a user can change after creation.
//! - `ScheduleItem::task_id` is a weak reference; it may name a task id, a
//!   task title, or nothing that exists anymore.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type TaskId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Work,
    Study,
    Personal,
    Health,
    Finance,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Study,
        Category::Personal,
        Category::Health,
        Category::Finance,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Study => "Study",
            Category::Personal => "Personal",
            Category::Health => "Health",
            Category::Finance => "Finance",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A due date, with or without a time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl FromStr for Deadline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        // Offset-bearing timestamps keep the wall-clock time they were written in
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Deadline::DateTime(dt.naive_local()));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"] {
            if let Ok(dt) = DateTime::parse_from_str(s, format) {
                return Ok(Deadline::DateTime(dt.naive_local()));
            }
        }

        for format in [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%Y-%m-%d %I:%M %p",
        ] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Deadline::DateTime(dt));
            }
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Deadline::Date)
            .map_err(|_| format!("'{s}' is not an ISO date or date-time"))
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deadline::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Deadline::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M")),
        }
    }
}

impl Serialize for Deadline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A validated task as returned by the extraction model, before it gets an identity
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDescriptor {
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub priority: Priority,
    pub deadline: Option<Deadline>,
    pub estimated_minutes: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub priority: Priority,
    pub deadline: Option<Deadline>,
    pub estimated_minutes: Option<u32>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Give an extracted descriptor a fresh identity
    pub fn from_descriptor(descriptor: TaskDescriptor, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: descriptor.title,
            description: descriptor.description,
            category: descriptor.category,
            priority: descriptor.priority,
            deadline: descriptor.deadline,
            estimated_minutes: Some(descriptor.estimated_minutes),
            completed: false,
            created_at: now,
        }
    }

    fn sample(
        title: &str,
        category: Category,
        priority: Priority,
        minutes: u32,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            category,
            priority,
            deadline: None,
            estimated_minutes: Some(minutes),
            completed,
            created_at: now,
        }
    }
}

/// Tasks preloaded into a fresh session
pub fn sample_tasks(now: DateTime<Utc>) -> Vec<Task> {
    vec![
        Task::sample("Review quarterly budget", Category::Finance, Priority::High, 45, false, now),
        Task::sample("Grocery shopping", Category::Personal, Priority::Medium, 60, false, now),
        Task::sample("Client meeting preparation", Category::Work, Priority::High, 30, true, now),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleItem {
    pub time: String,
    pub activity: String,
    pub task_id: Option<String>,
    pub duration_minutes: u32,
}

/// A validated schedule as returned by the planning model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDescriptor {
    pub focus_of_the_day: String,
    pub schedule: Vec<ScheduleItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayPlan {
    pub date: DateTime<Utc>,
    pub focus_of_the_day: String,
    pub schedule: Vec<ScheduleItem>,
}

impl DayPlan {
    pub fn from_descriptor(descriptor: PlanDescriptor, now: DateTime<Utc>) -> Self {
        Self {
            date: now,
            focus_of_the_day: descriptor.focus_of_the_day,
            schedule: descriptor.schedule,
        }
    }

    /// Best-effort lookup of the task a schedule item points at:
    /// exact id first, then case-insensitive title
    pub fn linked_task<'a>(item: &ScheduleItem, tasks: &'a [Task]) -> Option<&'a Task> {
        let reference = item.task_id.as_deref()?.trim();
        if reference.is_empty() {
            return None;
        }

        tasks
            .iter()
            .find(|task| task.id.to_string() == reference)
            .or_else(|| {
                tasks
                    .iter()
                    .find(|task| task.title.eq_ignore_ascii_case(reference))
            })
    }
}

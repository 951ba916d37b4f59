use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Board column a task sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// All statuses in column order
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// The serialized name (`pending`, `in-progress`, `completed`)
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Column heading used by the board view
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status \"{0}\" (expected pending, in-progress or completed)")]
pub struct ParseStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// A node in a task's checklist. Children nest to any depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
}

impl SubTask {
    /// A fresh, uncompleted leaf with a newly allocated id
    pub fn new(text: impl Into<String>) -> Self {
        SubTask {
            id: new_id(),
            text: text.into(),
            completed: false,
            subtasks: Vec::new(),
        }
    }
}

/// A top-level work item on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
    /// Milliseconds since the Unix epoch (UTC)
    pub created_at: i64,
}

impl Task {
    /// Create a new task with a fresh id, stamped with the current time
    pub fn new(title: impl Into<String>, description: impl Into<String>, status: TaskStatus) -> Self {
        Task {
            id: new_id(),
            title: title.into(),
            description: description.into(),
            status,
            subtasks: Vec::new(),
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Merge a patch over this task, producing the replacement record.
    /// `id` and `created_at` always come from `self`.
    pub fn merged(&self, patch: &TaskPatch) -> Task {
        Task {
            id: self.id.clone(),
            title: patch.title.clone().unwrap_or_else(|| self.title.clone()),
            description: patch
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            status: patch.status.unwrap_or(self.status),
            subtasks: patch
                .subtasks
                .clone()
                .unwrap_or_else(|| self.subtasks.clone()),
            created_at: self.created_at,
        }
    }
}

/// Partial update for a task. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<SubTask>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        TaskPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.subtasks.is_none()
    }
}

/// A patch that overwrites every mutable field with the snapshot's values.
/// Used when history restores a whole record.
impl From<&Task> for TaskPatch {
    fn from(task: &Task) -> Self {
        TaskPatch {
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            status: Some(task.status),
            subtasks: Some(task.subtasks.clone()),
        }
    }
}

/// Checklist progress for one task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total: usize,
    pub completed: usize,
}

impl Progress {
    /// `completed / total`, or 0 for an empty checklist
    pub fn fraction(self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Whole-number percentage, rounded down
    pub fn percent(self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.completed * 100 / self.total
        }
    }
}

impl std::ops::Add for Progress {
    type Output = Progress;

    fn add(self, rhs: Progress) -> Progress {
        Progress {
            total: self.total + rhs.total,
            completed: self.completed + rhs.completed,
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::TaskId;
use crate::params::{Field, TaskParams};
use crate::validation::{ValidationErrors, BLANK, NEGATIVE};

/// Board column a task belongs to. Declaration order is display order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Every status in rank order.
    pub const ALL: [TaskStatus; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Ordinal used for listing: todo < in_progress < done.
    pub fn rank(self) -> u8 {
        match self {
            Self::Todo => 0,
            Self::InProgress => 1,
            Self::Done => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub position: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a task. `position: None` appends to the column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub position: Option<i64>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            title: title.into(),
            status,
            ..Self::default()
        }
    }

    pub fn at(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn from_params(params: TaskParams) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let status = match params.status {
            Field::Absent => TaskStatus::default(),
            Field::Null => {
                errors.add("status", BLANK);
                TaskStatus::default()
            }
            Field::Value(status) => status,
        };

        let task = Self {
            title: params.title.into_value().unwrap_or_default(),
            description: params.description.into_value(),
            status,
            due_date: params.due_date.into_value(),
            position: params.position.into_value(),
        };
        if let Err(invalid) = task.validate() {
            errors.merge(invalid);
        }
        errors.into_result(task)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.title.trim().is_empty() {
            errors.add("title", BLANK);
        }
        if self.position.is_some_and(|p| p < 0) {
            errors.add("position", NEGATIVE);
        }
        errors.into_result(())
    }
}

/// Partial update. Outer `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<NaiveDate>>,
    pub position: Option<i64>,
}

impl TaskPatch {
    pub fn from_params(params: TaskParams) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = match params.title {
            Field::Absent => None,
            Field::Null => {
                errors.add("title", BLANK);
                None
            }
            Field::Value(title) => Some(title),
        };

        let status = match params.status {
            Field::Absent => None,
            Field::Null => {
                errors.add("status", BLANK);
                None
            }
            Field::Value(status) => Some(status),
        };

        let patch = Self {
            title,
            description: params.description.into_patch(),
            status,
            due_date: params.due_date.into_patch(),
            // A null position means "let the board decide".
            position: params.position.into_value(),
        };
        if let Err(invalid) = patch.validate() {
            errors.merge(invalid);
        }
        errors.into_result(patch)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            errors.add("title", BLANK);
        }
        if self.position.is_some_and(|p| p < 0) {
            errors.add("position", NEGATIVE);
        }
        errors.into_result(())
    }

    /// Copy the plain fields onto `task`. Position is left to the board.
    pub fn apply_fields(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

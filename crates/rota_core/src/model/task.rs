use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ROOMS: [&str; 10] = [
    "Living Room",
    "Kitchen",
    "Bedroom",
    "Bathroom",
    "Dining Room",
    "Office",
    "Laundry Room",
    "Garage",
    "Garden",
    "Other",
];

/// Advisory only; nothing computes due dates from it.
pub const FREQUENCIES: [&str; 5] = ["Daily", "Weekly", "Bi-weekly", "Monthly", "As needed"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub task_name: String,
    pub assigned_to: String,
    pub room: String,
    pub frequency: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TaskStatus,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Nullable columns with a column default; a stored `null` reads as that default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Task {
    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Row payload for inserts. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub task_name: String,
    pub assigned_to: String,
    pub room: String,
    pub frequency: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl NewTask {
    pub fn into_task(self, id: i64) -> Task {
        Task {
            id,
            task_name: self.task_name,
            assigned_to: self.assigned_to,
            room: self.room,
            frequency: self.frequency,
            description: self.description,
            status: self.status,
            due_date: self.due_date,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }

    /// Names of required fields that are missing or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("task_name", &self.task_name),
            ("assigned_to", &self.assigned_to),
            ("room", &self.room),
            ("frequency", &self.frequency),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Partial update. For nullable columns, `Some(None)` writes NULL and
/// `None` leaves the column alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<String>>,
}

impl TaskPatch {
    /// Phase one of a rotation: mark done and hand over.
    pub fn completion(next_owner: &str, completed_at: &str) -> Self {
        Self {
            assigned_to: Some(next_owner.to_string()),
            status: Some(TaskStatus::Completed),
            completed_at: Some(Some(completed_at.to_string())),
            ..Self::default()
        }
    }

    /// Back to `pending` with the completion moment cleared.
    pub fn reopen() -> Self {
        Self {
            status: Some(TaskStatus::Pending),
            completed_at: Some(None),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(value) = &self.task_name {
            task.task_name = value.clone();
        }
        if let Some(value) = &self.assigned_to {
            task.assigned_to = value.clone();
        }
        if let Some(value) = &self.room {
            task.room = value.clone();
        }
        if let Some(value) = &self.frequency {
            task.frequency = value.clone();
        }
        if let Some(value) = &self.description {
            task.description = value.clone();
        }
        if let Some(value) = self.status {
            task.status = value;
        }
        if let Some(value) = &self.due_date {
            task.due_date = value.clone();
        }
        if let Some(value) = &self.completed_at {
            task.completed_at = value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NewTask, Task, TaskPatch, TaskStatus};

    fn sample_task() -> Task {
        Task {
            id: 1,
            task_name: "Vacuum".to_string(),
            assigned_to: "Fernand".to_string(),
            room: "Living Room".to_string(),
            frequency: "Weekly".to_string(),
            description: Some("under the sofa".to_string()),
            status: TaskStatus::Pending,
            due_date: None,
            created_at: "2026-01-10T08:00:00Z".to_string(),
            completed_at: None,
        }
    }

    #[test]
    fn deserializes_store_row_with_nulls() {
        let row = serde_json::json!({
            "id": 3,
            "task_name": "Clean bathroom",
            "assigned_to": "Yvonne",
            "room": "Bathroom",
            "frequency": "Monthly",
            "description": null,
            "status": "completed",
            "due_date": "2026-01-18",
            "created_at": "2026-01-13T10:30:00",
            "completed_at": "2026-01-13T10:30:00"
        });

        let task: Task = serde_json::from_value(row).unwrap();
        assert_eq!(task.id, 3);
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.description, None);
        assert_eq!(task.due_date.as_deref(), Some("2026-01-18"));
    }

    #[test]
    fn null_status_and_created_at_fall_back_to_defaults() {
        let row = serde_json::json!({
            "id": 9,
            "task_name": "Water plants",
            "assigned_to": "Fernand",
            "room": "Garden",
            "frequency": "Weekly",
            "status": null,
            "created_at": null
        });

        let task: Task = serde_json::from_value(row).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, "");
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn patch_serializes_only_touched_columns() {
        let patch = TaskPatch::reopen();
        let value = serde_json::to_value(&patch).unwrap();

        assert_eq!(
            value,
            serde_json::json!({ "status": "pending", "completed_at": null })
        );
    }

    #[test]
    fn completion_patch_sets_owner_status_and_timestamp() {
        let mut task = sample_task();
        TaskPatch::completion("Yvonne", "2026-01-12T09:00:00Z").apply_to(&mut task);

        assert_eq!(task.assigned_to, "Yvonne");
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.completed_at.as_deref(), Some("2026-01-12T09:00:00Z"));
        assert_eq!(task.description.as_deref(), Some("under the sofa"));
    }

    #[test]
    fn patch_can_clear_nullable_columns() {
        let mut task = sample_task();
        let patch = TaskPatch {
            description: Some(None),
            ..TaskPatch::default()
        };
        patch.apply_to(&mut task);

        assert_eq!(task.description, None);
        assert!(!patch.is_empty());
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn new_task_reports_blank_required_fields() {
        let new_task = NewTask {
            task_name: " ".to_string(),
            assigned_to: "Fernand".to_string(),
            room: String::new(),
            frequency: "Weekly".to_string(),
            description: None,
            status: TaskStatus::Pending,
            due_date: None,
            created_at: "2026-01-10T08:00:00Z".to_string(),
            completed_at: None,
        };

        assert_eq!(new_task.missing_fields(), vec!["task_name", "room"]);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Pending".parse::<TaskStatus>(), Ok(TaskStatus::Pending));
        assert_eq!("COMPLETED".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert!("archived".parse::<TaskStatus>().is_err());
    }
}

//! Task lifecycle: creation, completion with hand-over, reset, edits and
//! deletion, on top of a [`TaskStore`].
//!
//! Completing a task is a two-step saga. Phase one records the completion
//! and hands the task to the next participant; phase two reopens it as
//! `pending`. The store offers no transaction spanning both calls, so a
//! failure between them leaves the row `completed` ("stranded"). That case
//! is reported as [`AppError::PartialRotation`], resumed automatically the
//! next time the task is completed, and swept by [`TaskController::reconcile`].

use crate::error::AppError;
use crate::model::{
    FREQUENCIES, NewTask, ROOMS, Task, TaskPatch, TaskStatus, format_date, local_offset,
    now_timestamp, parse_date, start_of_day_utc,
};
use crate::rotation::Rotation;
use crate::store::{self, Column, Filter, Order, TaskQuery, TaskStore};
use serde::Serialize;
use time::{Date, UtcOffset};
use tracing::{info, warn};

/// Log target of completion events, kept at `info` by the default filter.
pub const COMPLETION_TARGET: &str = "rota::completion";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTaskInput {
    pub task_name: String,
    pub assigned_to: String,
    pub room: String,
    pub frequency: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

/// Fields to overwrite. For `description` and `due_date`, `Some(None)`
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub task_name: Option<String>,
    pub assigned_to: Option<String>,
    pub room: Option<String>,
    pub frequency: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub person: Option<String>,
    pub status: Option<TaskStatus>,
    pub room: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationOutcome {
    pub task: Task,
    pub previous_owner: String,
    pub next_owner: String,
    /// When the chore was marked done. The row itself no longer carries
    /// it once reopened.
    pub completed_at: String,
    /// The task had been stranded by an earlier partial rotation and was
    /// only reopened, not handed over again.
    pub resumed: bool,
}

pub struct TaskController<S: TaskStore> {
    store: S,
    rotation: Rotation,
}

impl<S: TaskStore> TaskController<S> {
    pub fn new(store: S, rotation: Rotation) -> Self {
        Self { store, rotation }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    pub fn create_task(&self, input: NewTaskInput) -> Result<Task, AppError> {
        let task_name = required_text("task_name", &input.task_name)?;
        let assigned_to = self.rotation.resolve(&input.assigned_to)?.to_string();
        let room = canonical_label("room", &input.room, &ROOMS)?;
        let frequency = canonical_label("frequency", &input.frequency, &FREQUENCIES)?;
        let description = optional_text(input.description.as_deref());
        let due_date = input.due_date.as_deref().map(normalize_due_date).transpose()?;

        let row = NewTask {
            task_name,
            assigned_to,
            room,
            frequency,
            description,
            status: TaskStatus::Pending,
            due_date,
            created_at: now_timestamp()?,
            completed_at: None,
        };

        let task = self
            .store
            .insert(std::slice::from_ref(&row))?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::store_unavailable("insert returned no row"))?;
        info!(id = task.id, owner = %task.assigned_to, "task created");
        Ok(task)
    }

    pub fn get_task(&self, id: i64) -> Result<Task, AppError> {
        store::get(&self.store, id)?.ok_or(AppError::NotFound(id))
    }

    pub fn list_all_tasks(&self) -> Result<Vec<Task>, AppError> {
        store::list_all(&self.store)
    }

    pub fn list_tasks_by_person(&self, person: &str) -> Result<Vec<Task>, AppError> {
        let person = self.rotation.resolve(person)?;
        store::list_filtered(&self.store, Column::AssignedTo, person)
    }

    /// Pending tasks, earliest due date first; undated tasks last.
    pub fn list_pending_tasks(&self) -> Result<Vec<Task>, AppError> {
        self.store.select(
            &TaskQuery::default()
                .filter(Filter::eq(Column::Status, TaskStatus::Pending.as_str()))
                .order_by(Order::asc(Column::DueDate)),
        )
    }

    /// Rows completed since local Monday of `today`'s week. Under normal
    /// operation rows are reopened immediately, so this mostly surfaces
    /// stranded ones.
    pub fn list_completed_this_week(&self, today: Date) -> Result<Vec<Task>, AppError> {
        self.list_completed_in_week(today, local_offset())
    }

    /// `completed_at` is stored in UTC, so the bound is Monday 00:00 at
    /// `offset` expressed as a UTC instant.
    pub fn list_completed_in_week(
        &self,
        today: Date,
        offset: UtcOffset,
    ) -> Result<Vec<Task>, AppError> {
        let monday = crate::stats::week_window(today).monday;
        self.store.select(
            &TaskQuery::default()
                .filter(Filter::eq(Column::Status, TaskStatus::Completed.as_str()))
                .filter(Filter::gte(Column::CompletedAt, start_of_day_utc(monday, offset)?)),
        )
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let mut query = TaskQuery::all();
        if let Some(person) = filter.person.as_deref() {
            let person = self.rotation.resolve(person)?;
            query = query.filter(Filter::eq(Column::AssignedTo, person));
        }
        if let Some(status) = filter.status {
            query = query.filter(Filter::eq(Column::Status, status.as_str()));
        }
        if let Some(room) = filter.room.as_deref() {
            let room = canonical_label("room", room, &ROOMS)?;
            query = query.filter(Filter::eq(Column::Room, room));
        }
        self.store.select(&query)
    }

    pub fn complete_and_rotate(&self, id: i64) -> Result<RotationOutcome, AppError> {
        let task = self.get_task(id)?;
        if task.status == TaskStatus::Completed {
            return self.resume_rotation(task);
        }

        let previous_owner = task.assigned_to.clone();
        let next_owner = self.rotation.next(&previous_owner)?.to_string();
        let completed_at = now_timestamp()?;

        let guards = [
            Filter::eq(Column::AssignedTo, previous_owner.as_str()),
            Filter::eq(Column::Status, TaskStatus::Pending.as_str()),
        ];
        let completion = TaskPatch::completion(&next_owner, &completed_at);
        if self.store.update(id, &completion, &guards)?.is_none() {
            return Err(match store::get(&self.store, id)? {
                None => AppError::NotFound(id),
                Some(_) => AppError::conflict(format!(
                    "task {id} changed while it was being completed"
                )),
            });
        }
        info!(
            target: COMPLETION_TARGET,
            id,
            from = %previous_owner,
            to = %next_owner,
            completed_at = %completed_at,
            "task completed"
        );

        let task = self.reopen_stranded(id)?;
        Ok(RotationOutcome {
            task,
            previous_owner,
            next_owner,
            completed_at,
            resumed: false,
        })
    }

    /// Reopens every stranded row. Returns the rows that were repaired.
    pub fn reconcile(&self) -> Result<Vec<Task>, AppError> {
        let stranded = self.store.select(
            &TaskQuery::default()
                .filter(Filter::eq(Column::Status, TaskStatus::Completed.as_str()))
                .order_by(Order::asc(Column::Id)),
        )?;

        let mut repaired = Vec::with_capacity(stranded.len());
        for task in stranded {
            let guards = [Filter::eq(Column::Status, TaskStatus::Completed.as_str())];
            if let Some(task) = self.store.update(task.id, &TaskPatch::reopen(), &guards)? {
                info!(id = task.id, owner = %task.assigned_to, "stranded task reopened");
                repaired.push(task);
            }
        }
        Ok(repaired)
    }

    /// Forces `pending` with no completion moment; the owner is kept.
    pub fn reset_task(&self, id: i64) -> Result<Task, AppError> {
        let task = self
            .store
            .update(id, &TaskPatch::reopen(), &[])?
            .ok_or(AppError::NotFound(id))?;
        info!(id, "task reset");
        Ok(task)
    }

    pub fn update_task(&self, id: i64, update: TaskUpdate) -> Result<Task, AppError> {
        if update.is_empty() {
            return Err(AppError::invalid_input("nothing to update"));
        }

        let patch = TaskPatch {
            task_name: update
                .task_name
                .as_deref()
                .map(|value| required_text("task_name", value))
                .transpose()?,
            assigned_to: update
                .assigned_to
                .as_deref()
                .map(|value| self.rotation.resolve(value).map(str::to_string))
                .transpose()?,
            room: update
                .room
                .as_deref()
                .map(|value| canonical_label("room", value, &ROOMS))
                .transpose()?,
            frequency: update
                .frequency
                .as_deref()
                .map(|value| canonical_label("frequency", value, &FREQUENCIES))
                .transpose()?,
            description: update
                .description
                .as_ref()
                .map(|value| optional_text(value.as_deref())),
            due_date: update
                .due_date
                .as_ref()
                .map(|value| value.as_deref().map(normalize_due_date).transpose())
                .transpose()?,
            ..TaskPatch::default()
        };

        let task = self
            .store
            .update(id, &patch, &[])?
            .ok_or(AppError::NotFound(id))?;
        info!(id, "task updated");
        Ok(task)
    }

    /// `Ok(false)` when the id did not exist.
    pub fn delete_task(&self, id: i64) -> Result<bool, AppError> {
        let removed = self.store.delete(id)?;
        if removed {
            info!(id, "task deleted");
        }
        Ok(removed)
    }

    fn resume_rotation(&self, task: Task) -> Result<RotationOutcome, AppError> {
        let completed_at = task.completed_at.clone().unwrap_or_default();
        let next_owner = task.assigned_to.clone();
        let previous_owner = self
            .rotation
            .participants()
            .iter()
            .find(|name| self.rotation.next(name).ok() == Some(next_owner.as_str()))
            .cloned()
            .unwrap_or_else(|| next_owner.clone());
        info!(id = task.id, owner = %next_owner, "resuming stranded rotation");

        let task = self.reopen_stranded(task.id)?;
        Ok(RotationOutcome {
            task,
            previous_owner,
            next_owner,
            completed_at,
            resumed: true,
        })
    }

    fn reopen_stranded(&self, id: i64) -> Result<Task, AppError> {
        let guards = [Filter::eq(Column::Status, TaskStatus::Completed.as_str())];
        match self.store.update(id, &TaskPatch::reopen(), &guards) {
            Ok(Some(task)) => Ok(task),
            Ok(None) => match store::get(&self.store, id)? {
                Some(task) if task.status == TaskStatus::Pending => Ok(task),
                Some(_) => Err(AppError::conflict(format!(
                    "task {id} changed while it was being reopened"
                ))),
                None => Err(AppError::NotFound(id)),
            },
            Err(err) => {
                warn!(id, error = %err, "rotation left task completed");
                Err(AppError::PartialRotation {
                    id,
                    reason: err.message(),
                })
            }
        }
    }
}

fn required_text(field: &str, raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn canonical_label(field: &str, raw: &str, allowed: &[&str]) -> Result<String, AppError> {
    let trimmed = required_text(field, raw)?;
    allowed
        .iter()
        .find(|label| label.eq_ignore_ascii_case(&trimmed))
        .map(|label| label.to_string())
        .ok_or_else(|| {
            AppError::invalid_input(format!(
                "{field} '{trimmed}' is not one of: {}",
                allowed.join(", ")
            ))
        })
}

fn normalize_due_date(raw: &str) -> Result<String, AppError> {
    format_date(parse_date(raw)?)
}

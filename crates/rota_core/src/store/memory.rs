use crate::error::AppError;
use crate::model::{NewTask, Task, TaskPatch};
use crate::store::{Filter, TaskQuery, TaskStore, validate_rows};
use std::sync::{Mutex, MutexGuard};

/// In-process table with the same filter and ordering rules as the remote
/// one. Can be told to fail a later update to exercise partial transitions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<Task>,
    last_id: i64,
    offline: bool,
    updates_seen: usize,
    fail_update_at: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let last_id = tasks.iter().map(|task| task.id).max().unwrap_or(0);
        Self {
            state: Mutex::new(MemoryState {
                rows: tasks,
                last_id,
                ..MemoryState::default()
            }),
        }
    }

    /// Every call fails with `StoreUnavailable` while offline.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.offline = offline;
        }
    }

    /// Makes the `n`th update from now (1-based) fail.
    pub fn fail_nth_update(&self, n: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_update_at = Some(state.updates_seen + n);
        }
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.state
            .lock()
            .map(|state| state.rows.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, AppError> {
        let state = self
            .state
            .lock()
            .map_err(|_| AppError::store_unavailable("memory store lock poisoned"))?;
        if state.offline {
            return Err(AppError::store_unavailable("store is offline"));
        }
        Ok(state)
    }
}

fn row_value(task: &Task) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(task).map_err(|err| AppError::invalid_data(err.to_string()))
}

fn matches_all(task: &Task, filters: &[Filter]) -> Result<bool, AppError> {
    let row = row_value(task)?;
    Ok(filters.iter().all(|filter| filter.matches(&row)))
}

impl TaskStore for MemoryStore {
    fn insert(&self, rows: &[NewTask]) -> Result<Vec<Task>, AppError> {
        validate_rows(rows)?;
        let mut state = self.lock()?;
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            state.last_id += 1;
            let task = row.clone().into_task(state.last_id);
            state.rows.push(task.clone());
            inserted.push(task);
        }
        Ok(inserted)
    }

    fn select(&self, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let state = self.lock()?;
        let mut matched = Vec::new();
        for task in &state.rows {
            let row = row_value(task)?;
            if query.filters.iter().all(|filter| filter.matches(&row)) {
                matched.push((row, task.clone()));
            }
        }

        if let Some(order) = &query.order {
            matched.sort_by(|(left_row, left), (right_row, right)| {
                let by_id = left.id.cmp(&right.id);
                let by_id = if order.descending { by_id.reverse() } else { by_id };
                order.compare(left_row, right_row).then(by_id)
            });
        }

        let mut tasks: Vec<Task> = matched.into_iter().map(|(_, task)| task).collect();
        if let Some(limit) = query.limit {
            tasks.truncate(limit);
        }
        Ok(tasks)
    }

    fn update(
        &self,
        id: i64,
        patch: &TaskPatch,
        guards: &[Filter],
    ) -> Result<Option<Task>, AppError> {
        let mut state = self.lock()?;
        state.updates_seen += 1;
        if state.fail_update_at == Some(state.updates_seen) {
            state.fail_update_at = None;
            return Err(AppError::store_unavailable("injected update failure"));
        }

        for task in &mut state.rows {
            if task.id != id {
                continue;
            }
            if !matches_all(task, guards)? {
                return Ok(None);
            }
            patch.apply_to(task);
            return Ok(Some(task.clone()));
        }

        Ok(None)
    }

    fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        let before = state.rows.len();
        state.rows.retain(|task| task.id != id);
        Ok(state.rows.len() != before)
    }
}

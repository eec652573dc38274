use rota_core::error::AppError;
use rota_core::lifecycle::TaskController;
use rota_core::model::Task;
use rota_core::store::TaskStore;
use std::collections::BTreeSet;
use tracing::warn;

/// State of one run: the rows last read from the store, a one-shot notice
/// for the next render, and which tasks have their edit form open.
pub struct Session<S: TaskStore> {
    controller: TaskController<S>,
    tasks: Vec<Task>,
    notice: Option<String>,
    editing: BTreeSet<i64>,
}

impl<S: TaskStore> Session<S> {
    pub fn new(controller: TaskController<S>) -> Self {
        Self {
            controller,
            tasks: Vec::new(),
            notice: None,
            editing: BTreeSet::new(),
        }
    }

    pub fn controller(&self) -> &TaskController<S> {
        &self.controller
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn refresh(&mut self) -> Result<(), AppError> {
        self.tasks = self.controller.list_all_tasks()?;
        Ok(())
    }

    /// Runs a store-changing action, then re-reads every row whether or not
    /// it succeeded. A failed re-read is logged and leaves the old rows.
    pub fn mutate<T, F>(&mut self, action: F) -> Result<T, AppError>
    where
        F: FnOnce(&TaskController<S>) -> Result<T, AppError>,
    {
        let result = action(&self.controller);
        if let Err(err) = self.refresh() {
            warn!(error = %err, "re-fetch after action failed");
        }
        result
    }

    pub fn set_notice<M: Into<String>>(&mut self, notice: M) {
        self.notice = Some(notice.into());
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn is_editing(&self, id: i64) -> bool {
        self.editing.contains(&id)
    }

    /// Opens the edit form; the task must exist.
    pub fn open_edit(&mut self, id: i64) -> Result<Task, AppError> {
        let task = self.controller.get_task(id)?;
        self.editing.insert(id);
        Ok(task)
    }

    /// `false` when no form was open for `id`.
    pub fn close_edit(&mut self, id: i64) -> bool {
        self.editing.remove(&id)
    }
}

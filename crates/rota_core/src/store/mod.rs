//! Task store gateway: the translation layer between lifecycle operations
//! and the remote table.
//!
//! Every call is an independent round trip. Nothing here is atomic across
//! calls, so multi-step transitions live in [`crate::lifecycle`] where
//! partial failure can be detected.

mod memory;
mod query;
mod rest;

pub use memory::MemoryStore;
pub use query::{Column, Filter, FilterOp, Order, TaskQuery};
pub use rest::RestStore;

use crate::error::AppError;
use crate::model::{NewTask, Task, TaskPatch};

pub trait TaskStore {
    /// Inserts the rows and returns them as stored, ids assigned.
    fn insert(&self, rows: &[NewTask]) -> Result<Vec<Task>, AppError>;

    fn select(&self, query: &TaskQuery) -> Result<Vec<Task>, AppError>;

    /// Applies `patch` to the row with `id` when every guard also holds.
    /// `Ok(None)` means no row matched.
    fn update(
        &self,
        id: i64,
        patch: &TaskPatch,
        guards: &[Filter],
    ) -> Result<Option<Task>, AppError>;

    /// `Ok(false)` when there was nothing to delete.
    fn delete(&self, id: i64) -> Result<bool, AppError>;
}

pub fn list_all(store: &dyn TaskStore) -> Result<Vec<Task>, AppError> {
    store.select(&TaskQuery::all())
}

/// Equality filter on one column, newest created first.
pub fn list_filtered(
    store: &dyn TaskStore,
    column: Column,
    value: &str,
) -> Result<Vec<Task>, AppError> {
    store.select(&TaskQuery::all().filter(Filter::eq(column, value)))
}

pub fn get(store: &dyn TaskStore, id: i64) -> Result<Option<Task>, AppError> {
    Ok(store.select(&TaskQuery::by_id(id))?.into_iter().next())
}

pub(crate) fn validate_rows(rows: &[NewTask]) -> Result<(), AppError> {
    if rows.is_empty() {
        return Err(AppError::invalid_input("nothing to insert"));
    }

    for row in rows {
        let missing = row.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::invalid_input(format!(
                "required fields missing: {}",
                missing.join(", ")
            )));
        }
    }

    Ok(())
}

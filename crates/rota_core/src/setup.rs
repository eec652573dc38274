//! First-run helpers: table schema, sample chores and a reachability check.

use crate::error::AppError;
use crate::lifecycle::{NewTaskInput, TaskController};
use crate::model::Task;
use crate::rotation::Rotation;
use crate::store::{TaskQuery, TaskStore};
use serde::Serialize;
use tracing::info;

pub const SCHEMA_SQL: &str = r#"CREATE TABLE IF NOT EXISTS cleaning_tasks (
    id SERIAL PRIMARY KEY,
    task_name VARCHAR(255) NOT NULL,
    assigned_to VARCHAR(50) NOT NULL,
    room VARCHAR(100) NOT NULL,
    frequency VARCHAR(50) NOT NULL,
    description TEXT,
    status VARCHAR(20) DEFAULT 'pending',
    due_date DATE,
    created_at TIMESTAMP DEFAULT NOW(),
    completed_at TIMESTAMP
);"#;

/// Schema for a table name other than the default.
pub fn schema_sql(table: &str) -> String {
    SCHEMA_SQL.replacen("cleaning_tasks", table.trim(), 1)
}

/// Four starter chores, dealt round the rotation in order.
pub fn sample_tasks(rotation: &Rotation) -> Vec<NewTaskInput> {
    let samples = [
        (
            "Clean the litter box",
            "Bathroom",
            "Weekly",
            "Clean and refill the cat litter",
            Some("2026-01-20"),
        ),
        (
            "Take out trash & recycling",
            "Kitchen",
            "Weekly",
            "Empty all bins and take them to the curb on collection day",
            Some("2026-01-19"),
        ),
        (
            "Vacuum living room",
            "Living Room",
            "Bi-weekly",
            "Deep vacuum including under furniture",
            None,
        ),
        (
            "Clean bathroom thoroughly",
            "Bathroom",
            "Monthly",
            "Deep clean toilet, shower, sink and floor",
            None,
        ),
    ];

    let participants = rotation.participants();
    samples
        .into_iter()
        .enumerate()
        .map(|(index, (name, room, frequency, description, due_date))| NewTaskInput {
            task_name: name.to_string(),
            assigned_to: participants[index % participants.len()].clone(),
            room: room.to_string(),
            frequency: frequency.to_string(),
            description: Some(description.to_string()),
            due_date: due_date.map(str::to_string),
        })
        .collect()
}

pub fn seed<S: TaskStore>(controller: &TaskController<S>) -> Result<Vec<Task>, AppError> {
    let created = sample_tasks(controller.rotation())
        .into_iter()
        .map(|input| controller.create_task(input))
        .collect::<Result<Vec<_>, _>>()?;
    info!(count = created.len(), "sample tasks added");
    Ok(created)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub reachable: bool,
    pub sample_rows: usize,
    pub error: Option<String>,
}

/// Reads at most one row. Failure is reported, not returned.
pub fn check_connection(store: &dyn TaskStore) -> ConnectionReport {
    match store.select(&TaskQuery::default().limit(1)) {
        Ok(rows) => ConnectionReport {
            reachable: true,
            sample_rows: rows.len(),
            error: None,
        },
        Err(err) => ConnectionReport {
            reachable: false,
            sample_rows: 0,
            error: Some(err.to_string()),
        },
    }
}

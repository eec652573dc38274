use rota_core::config::Palette;
use rota_core::error::AppError;
use rota_core::lifecycle::RotationOutcome;
use rota_core::model::{FREQUENCIES, ROOMS, Task, format_date};
use rota_core::setup::ConnectionReport;
use rota_core::stats::{DashboardSummary, LabelCount, TaskStatistics, WeekWindow};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::macros::format_description;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Task")]
    task_name: String,
    #[tabled(rename = "Assigned")]
    assigned_to: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "Frequency")]
    frequency: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Due")]
    due_date: String,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Tasks")]
    count: usize,
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn task_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks.".to_string();
    }

    let rows = tasks.iter().map(|task| TaskRow {
        id: task.id,
        task_name: task.task_name.clone(),
        assigned_to: task.assigned_to.clone(),
        room: task.room.clone(),
        frequency: task.frequency.clone(),
        status: task.status.to_string(),
        due_date: task.due_date.clone().unwrap_or_else(|| "-".to_string()),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub fn task_detail(task: &Task, palette: &Palette) -> String {
    let lines = [
        ("Task", task.task_name.clone()),
        ("Assigned to", task.assigned_to.clone()),
        ("Room", task.room.clone()),
        ("Frequency", task.frequency.clone()),
        ("Status", task.status.to_string()),
        ("Description", task.description.clone().unwrap_or_else(|| "-".to_string())),
        ("Due", task.due_date.clone().unwrap_or_else(|| "-".to_string())),
        ("Created", task.created_at.clone()),
        ("Completed", task.completed_at.clone().unwrap_or_else(|| "-".to_string())),
    ];

    let mut out = palette.accentize(&format!("#{} {}", task.id, task.task_name));
    for (label, value) in lines {
        out.push('\n');
        out.push_str(&format!("{:<12} {}", palette.mutedize(label), value));
    }
    out
}

pub fn rotation_message(outcome: &RotationOutcome) -> String {
    if outcome.resumed {
        format!(
            "Finished handing over '{}' to {} (#{})",
            outcome.task.task_name, outcome.next_owner, outcome.task.id
        )
    } else {
        format!(
            "'{}' done by {}; next up: {} (#{})",
            outcome.task.task_name, outcome.previous_owner, outcome.next_owner, outcome.task.id
        )
    }
}

fn week_header(window: &WeekWindow) -> Result<String, AppError> {
    let short = format_description!("[month repr:long] [day]");
    let long = format_description!("[month repr:long] [day], [year]");
    let monday = window
        .monday
        .format(short)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    let sunday = window
        .sunday
        .format(long)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    Ok(format!("Week {} ({monday} - {sunday})", window.number))
}

/// `pending` pairs each open task with whoever gets it after this one.
pub fn dashboard(
    window: &WeekWindow,
    summary: &DashboardSummary,
    pending: &[(Task, String)],
    palette: &Palette,
) -> Result<String, AppError> {
    let mut out = palette.accentize(&week_header(window)?);
    out.push('\n');
    for load in &summary.pending_by_person {
        out.push_str(&format!("{}: {} pending\n", load.person, load.pending));
    }
    out.push_str(&format!(
        "Total pending: {}  Completion rate: {:.0}%\n",
        summary.total_pending, summary.completion_rate
    ));

    if pending.is_empty() {
        out.push_str(&palette.mutedize("Nothing pending this week."));
        return Ok(out);
    }

    for (task, next_owner) in pending {
        let due = task
            .due_date
            .as_deref()
            .map(|due| format!(" due {due}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "\n#{} {} [{}]{} - {} (next: {})",
            task.id,
            task.task_name,
            task.room,
            due,
            task.assigned_to,
            palette.mutedize(next_owner)
        ));
    }
    Ok(out)
}

fn count_table(title: &str, counts: &[LabelCount]) -> String {
    let rows = counts.iter().map(|entry| CountRow {
        label: entry.label.clone(),
        count: entry.count,
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("{title}\n{table}")
}

pub fn statistics(stats: &TaskStatistics, palette: &Palette) -> Result<String, AppError> {
    if stats.total == 0 {
        return Ok("No tasks available for statistics.".to_string());
    }

    let mut sections = vec![
        count_table(&palette.accentize("By person"), &stats.by_person),
        count_table(&palette.accentize("By status"), &stats.by_status),
        count_table(&palette.accentize("By room"), &stats.by_room),
        count_table(&palette.accentize("By frequency"), &stats.by_frequency),
    ];

    if stats.daily_completions.is_empty() {
        sections.push(palette.mutedize("No completed tasks to show."));
    } else {
        let mut timeline = Vec::with_capacity(stats.daily_completions.len());
        for day in &stats.daily_completions {
            timeline.push(LabelCount {
                label: format_date(day.date)?,
                count: day.count,
            });
        }
        sections.push(count_table(&palette.accentize("Completions by day"), &timeline));
    }

    sections.push(format!(
        "Completion rate: {:.1}%\nAverage tasks per person: {:.1}\nOverdue tasks: {}",
        stats.completion_rate, stats.average_per_person, stats.overdue
    ));
    Ok(sections.join("\n\n"))
}

pub fn edit_form(task: &Task) -> String {
    format!(
        "Editing #{id} (save with `edit {id} --name .. --to .. --room .. --frequency .. --description .. --due ..`, close with `cancel {id}`)\n\
         name:        {name}\n\
         to:          {owner}\n\
         room:        {room}  [{rooms}]\n\
         frequency:   {frequency}  [{frequencies}]\n\
         description: {description}\n\
         due:         {due}",
        id = task.id,
        name = task.task_name,
        owner = task.assigned_to,
        room = task.room,
        rooms = ROOMS.join(", "),
        frequency = task.frequency,
        frequencies = FREQUENCIES.join(", "),
        description = task.description.as_deref().unwrap_or("-"),
        due = task.due_date.as_deref().unwrap_or("-"),
    )
}

pub fn connection_report(report: &ConnectionReport, table: &str) -> String {
    match &report.error {
        None => format!(
            "Connected. Table '{table}' is reachable ({} sample row(s)).",
            report.sample_rows
        ),
        Some(error) => format!(
            "Could not reach table '{table}': {error}\nCreate it with the statement from `rota setup sql`."
        ),
    }
}

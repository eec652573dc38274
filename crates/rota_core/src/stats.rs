use crate::model::{Task, TaskStatus, date_at_offset, local_offset, parse_date, parse_timestamp};
use serde::Serialize;
use std::collections::BTreeMap;
use time::{Date, Duration, UtcOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    pub number: u8,
    pub monday: Date,
    pub sunday: Date,
}

/// ISO week containing `today`, Monday through Sunday.
pub fn week_window(today: Date) -> WeekWindow {
    let monday = today - Duration::days(i64::from(today.weekday().number_days_from_monday()));
    WeekWindow {
        number: today.iso_week(),
        monday,
        sunday: monday + Duration::days(6),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonLoad {
    pub person: String,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub pending_by_person: Vec<PersonLoad>,
    pub total_pending: usize,
    pub completion_rate: f64,
}

pub fn dashboard_summary(tasks: &[Task], participants: &[String]) -> DashboardSummary {
    let pending_by_person = participants
        .iter()
        .map(|person| PersonLoad {
            person: person.clone(),
            pending: tasks
                .iter()
                .filter(|task| task.is_pending() && &task.assigned_to == person)
                .count(),
        })
        .collect();

    DashboardSummary {
        pending_by_person,
        total_pending: tasks.iter().filter(|task| task.is_pending()).count(),
        completion_rate: completion_rate(tasks),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCompletions {
    pub date: Date,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatistics {
    pub total: usize,
    pub by_person: Vec<LabelCount>,
    pub by_status: Vec<LabelCount>,
    pub by_room: Vec<LabelCount>,
    pub by_frequency: Vec<LabelCount>,
    pub daily_completions: Vec<DailyCompletions>,
    pub completion_rate: f64,
    pub average_per_person: f64,
    pub overdue: usize,
}

pub fn task_statistics(tasks: &[Task], today: Date) -> TaskStatistics {
    task_statistics_in(tasks, today, local_offset())
}

/// Completions are counted on the calendar day they fall on at `offset`.
pub fn task_statistics_in(tasks: &[Task], today: Date, offset: UtcOffset) -> TaskStatistics {
    let by_person = count_by(tasks, |task| task.assigned_to.clone());
    let average_per_person = if by_person.is_empty() {
        0.0
    } else {
        tasks.len() as f64 / by_person.len() as f64
    };

    let mut daily: BTreeMap<Date, usize> = BTreeMap::new();
    for task in tasks.iter().filter(|task| task.status == TaskStatus::Completed) {
        // rows without a readable completion moment are left off the timeline
        if let Some(raw) = task.completed_at.as_deref()
            && let Ok(moment) = parse_timestamp(raw)
            && let Some(day) = date_at_offset(moment, offset)
        {
            *daily.entry(day).or_default() += 1;
        }
    }

    let overdue = tasks
        .iter()
        .filter(|task| task.is_pending())
        .filter_map(|task| task.due_date.as_deref())
        .filter_map(|raw| parse_date(raw).ok())
        .filter(|due| *due < today)
        .count();

    TaskStatistics {
        total: tasks.len(),
        by_status: count_by(tasks, |task| task.status.to_string()),
        by_room: count_by(tasks, |task| task.room.clone()),
        by_frequency: count_by(tasks, |task| task.frequency.clone()),
        by_person,
        daily_completions: daily
            .into_iter()
            .map(|(date, count)| DailyCompletions { date, count })
            .collect(),
        completion_rate: completion_rate(tasks),
        average_per_person,
        overdue,
    }
}

fn completion_rate(tasks: &[Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let completed = tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Completed)
        .count();
    completed as f64 / tasks.len() as f64 * 100.0
}

fn count_by<F>(tasks: &[Task], key: F) -> Vec<LabelCount>
where
    F: Fn(&Task) -> String,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for task in tasks {
        *counts.entry(key(task)).or_default() += 1;
    }

    let mut counts: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    counts.sort_by(|left, right| right.count.cmp(&left.count).then_with(|| left.label.cmp(&right.label)));
    counts
}

mod task;
mod timestamp;

pub use task::{FREQUENCIES, NewTask, ROOMS, Task, TaskPatch, TaskStatus};
pub use timestamp::{
    date_at_offset, format_date, local_offset, now_timestamp, parse_date, parse_timestamp,
    start_of_day_utc, today_local,
};

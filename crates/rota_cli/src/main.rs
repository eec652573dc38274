mod cli;
mod render;
mod session;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use cli::{CONFIG_OVERRIDE_FLAG, Cli, Command, EditArgs, ListArgs, SetupCommand, collect_overrides};
use rota_core::config::{
    self, Config, Palette, StoreCredentials, merge_overrides, palette_for_theme,
};
use rota_core::error::AppError;
use rota_core::lifecycle::{
    COMPLETION_TARGET, NewTaskInput, TaskController, TaskFilter, TaskUpdate,
};
use rota_core::model::{Task, TaskStatus, today_local};
use rota_core::setup;
use rota_core::stats::{dashboard_summary, task_statistics, week_window};
use rota_core::store::{RestStore, TaskStore};
use session::Session;
use std::io::{self, BufRead};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "ROTA_LOG";

fn default_log_filter() -> String {
    format!("warn,{COMPLETION_TARGET}=info")
}

struct Runtime {
    config: Config,
    palette: Palette,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Reads `.env` from the working directory or a parent. Variables already
/// set in the process environment are left as they are.
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, ".env file ignored"),
    }
}

fn load_runtime(raw_overrides: &[String]) -> Result<Runtime, AppError> {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        warn!(error = %err, "config file ignored, using defaults");
    }

    let overrides = collect_overrides(raw_overrides).map_err(AppError::invalid_input)?;
    let config = merge_overrides(&loaded.config, &overrides);
    let palette = palette_for_theme(config.theme.as_deref());
    Ok(Runtime { config, palette })
}

fn open_session(config: &Config) -> Result<Session<RestStore>, AppError> {
    let rotation = config.rotation()?;
    let credentials = StoreCredentials::from_env()?;
    let store = RestStore::new(&credentials, config.table_name(), config.timeout())?;
    Ok(Session::new(TaskController::new(store, rotation)))
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", render::to_json(value)?);
    Ok(())
}

fn print_tasks(tasks: &[Task], json: bool) -> Result<(), AppError> {
    if json {
        print_json(&tasks)
    } else {
        println!("{}", render::task_table(tasks));
        Ok(())
    }
}

fn parse_status(raw: &str) -> Result<TaskStatus, AppError> {
    raw.parse::<TaskStatus>().map_err(AppError::invalid_input)
}

fn edit_update(args: &EditArgs) -> TaskUpdate {
    TaskUpdate {
        task_name: args.task_name.clone(),
        assigned_to: args.assigned_to.clone(),
        room: args.room.clone(),
        frequency: args.frequency.clone(),
        description: if args.clear_description {
            Some(None)
        } else {
            args.description.clone().map(Some)
        },
        due_date: if args.clear_due {
            Some(None)
        } else {
            args.due_date.clone().map(Some)
        },
    }
}

fn list_tasks<S: TaskStore>(
    controller: &TaskController<S>,
    args: ListArgs,
) -> Result<Vec<Task>, AppError> {
    if args.pending {
        return controller.list_pending_tasks();
    }
    if args.completed_this_week {
        return controller.list_completed_this_week(today_local());
    }

    match (args.person, args.status, args.room) {
        (Some(person), None, None) => controller.list_tasks_by_person(&person),
        (person, status, room) => controller.list_tasks(&TaskFilter {
            person,
            status: status.as_deref().map(parse_status).transpose()?,
            room,
        }),
    }
}

fn show_dashboard<S: TaskStore>(
    session: &mut Session<S>,
    json: bool,
    runtime: &Runtime,
) -> Result<(), AppError> {
    let window = week_window(today_local());
    let participants = session.controller().rotation().participants().to_vec();
    session.refresh()?;
    let summary = dashboard_summary(session.tasks(), &participants);

    let controller = session.controller();
    let pending: Vec<(Task, String)> = controller
        .list_pending_tasks()?
        .into_iter()
        .map(|task| {
            let next_owner = controller
                .rotation()
                .next(&task.assigned_to)
                .map(str::to_string)
                .unwrap_or_else(|_| "-".to_string());
            (task, next_owner)
        })
        .collect();

    if json {
        let pending: Vec<serde_json::Value> = pending
            .iter()
            .map(|(task, next_owner)| serde_json::json!({ "task": task, "next_owner": next_owner }))
            .collect();
        return print_json(&serde_json::json!({
            "week": window,
            "summary": summary,
            "pending": pending,
        }));
    }

    println!(
        "{}",
        render::dashboard(&window, &summary, &pending, &runtime.palette)?
    );
    Ok(())
}

fn run_setup<S: TaskStore>(
    session: &mut Session<S>,
    setup_command: SetupCommand,
    json: bool,
    runtime: &Runtime,
) -> Result<(), AppError> {
    let table = runtime.config.table_name();
    match setup_command {
        SetupCommand::Sql => {
            println!("{}", setup::schema_sql(table));
        }
        SetupCommand::Seed => {
            let created = session.mutate(setup::seed)?;
            print_tasks(&created, json)?;
            if !json {
                session.set_notice(format!("Added {} sample task(s)", created.len()));
            }
        }
        SetupCommand::Check => {
            let report = setup::check_connection(session.controller().store());
            if json {
                print_json(&report)?;
            } else {
                println!("{}", render::connection_report(&report, table));
            }
            if !report.reachable {
                return Err(AppError::store_unavailable(format!(
                    "table '{table}' is not reachable"
                )));
            }
        }
    }
    Ok(())
}

fn run_command<S: TaskStore>(
    session: &mut Session<S>,
    command: Command,
    json: bool,
    runtime: &Runtime,
) -> Result<(), AppError> {
    match command {
        Command::Dashboard => show_dashboard(session, json, runtime)?,
        Command::Add {
            task_name,
            assigned_to,
            room,
            frequency,
            description,
            due_date,
        } => {
            let input = NewTaskInput {
                task_name,
                assigned_to,
                room,
                frequency,
                description,
                due_date,
            };
            let task = session.mutate(|controller| controller.create_task(input))?;
            if json {
                print_json(&task)?;
            } else {
                session.set_notice(format!(
                    "Added task: {} (#{}) for {}",
                    task.task_name, task.id, task.assigned_to
                ));
            }
        }
        Command::List(args) => {
            let tasks = list_tasks(session.controller(), args)?;
            print_tasks(&tasks, json)?;
        }
        Command::Show { id } => {
            let task = session.controller().get_task(id)?;
            if json {
                print_json(&task)?;
            } else {
                println!("{}", render::task_detail(&task, &runtime.palette));
                if session.is_editing(id) {
                    println!("\n{}", render::edit_form(&task));
                }
            }
        }
        Command::Done { id } => {
            let outcome = session.mutate(|controller| controller.complete_and_rotate(id))?;
            if json {
                print_json(&outcome)?;
            } else {
                session.set_notice(render::rotation_message(&outcome));
            }
        }
        Command::Reset { id } => {
            let task = session.mutate(|controller| controller.reset_task(id))?;
            if json {
                print_json(&task)?;
            } else {
                session.set_notice(format!("Reset task: {} (#{})", task.task_name, task.id));
            }
        }
        Command::Edit(args) => {
            let id = args.id;
            if !args.has_fields() {
                let task = session.open_edit(id)?;
                if json {
                    print_json(&task)?;
                } else {
                    println!("{}", render::edit_form(&task));
                }
                return Ok(());
            }

            let update = edit_update(&args);
            let task = session.mutate(|controller| controller.update_task(id, update))?;
            session.close_edit(id);
            if json {
                print_json(&task)?;
            } else {
                session.set_notice(format!("Updated task: {} (#{})", task.task_name, task.id));
            }
        }
        Command::Cancel { id } => {
            let closed = session.close_edit(id);
            if json {
                print_json(&serde_json::json!({ "id": id, "closed": closed }))?;
            } else if closed {
                session.set_notice(format!("Closed edit form for #{id}"));
            } else {
                session.set_notice(format!("No edit form open for #{id}"));
            }
        }
        Command::Delete { id } => {
            let removed = session.mutate(|controller| controller.delete_task(id))?;
            session.close_edit(id);
            if json {
                print_json(&serde_json::json!({ "id": id, "deleted": removed }))?;
            } else if removed {
                session.set_notice(format!("Deleted task #{id}"));
            } else {
                session.set_notice(format!("No task #{id}; nothing deleted"));
            }
        }
        Command::Stats => {
            session.refresh()?;
            let stats = task_statistics(session.tasks(), today_local());
            if json {
                print_json(&stats)?;
            } else {
                println!("{}", render::statistics(&stats, &runtime.palette)?);
            }
        }
        Command::Reconcile => {
            let repaired = session.mutate(TaskController::reconcile)?;
            if json {
                print_json(&repaired)?;
            } else if repaired.is_empty() {
                session.set_notice("Nothing to reconcile");
            } else {
                println!("{}", render::task_table(&repaired));
                session.set_notice(format!("Reopened {} task(s)", repaired.len()));
            }
        }
        Command::Setup { setup } => run_setup(session, setup, json, runtime)?,
    }

    Ok(())
}

fn report_error(err: &AppError) {
    eprintln!("ERROR: {err}");
    if let AppError::PartialRotation { id, .. } = err {
        eprintln!("Task #{id} is still marked completed; `rota done {id}` or `rota reconcile` finishes the hand-over.");
    }
}

/// Runs one command and shows the notice it left behind.
fn dispatch<S: TaskStore>(
    session: &mut Session<S>,
    cli: Cli,
    runtime: &Runtime,
) -> Result<(), AppError> {
    let result = run_command(session, cli.command, cli.json, runtime);
    if let Some(notice) = session.take_notice() {
        println!("{}", runtime.palette.accentize(&notice));
    }
    result
}

fn run_interactive() -> Result<(), AppError> {
    let runtime = load_runtime(&[])?;
    let mut session = open_session(&runtime.config)?;
    match session.mutate(TaskController::reconcile) {
        Ok(repaired) if !repaired.is_empty() => {
            println!("Finished {} interrupted hand-over(s)", repaired.len());
        }
        Ok(_) => {}
        Err(err) => report_error(&err),
    }

    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("rota".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                println!("{err}");
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input(format!(
                    "{CONFIG_OVERRIDE_FLAG} is only read when rota starts"
                ))
            );
            continue;
        }

        if let Err(err) = dispatch(&mut session, cli, &runtime) {
            report_error(&err);
        }
    }

    Ok(())
}

fn run_once(cli: Cli) -> Result<(), AppError> {
    let runtime = load_runtime(&cli.config_override)?;

    // the schema is needed before credentials exist
    if let Command::Setup {
        setup: SetupCommand::Sql,
    } = cli.command
    {
        println!("{}", setup::schema_sql(runtime.config.table_name()));
        return Ok(());
    }

    let mut session = open_session(&runtime.config)?;
    dispatch(&mut session, cli, &runtime)
}

fn main() {
    init_tracing();
    load_dotenv();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_once(cli) {
        report_error(&err);
        std::process::exit(1);
    }
}

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("rota-{nanos}-{file_name}"))
}

fn run_interactive(server: Option<&mockito::ServerGuard>, input: &str) -> std::process::Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_rota"));
    command
        .env("ROTA_CONFIG_PATH", temp_path("interactive-config.json"))
        .env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_KEY")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(server) = server {
        command
            .env("SUPABASE_URL", server.url())
            .env("SUPABASE_KEY", "anon-key");
    }

    let mut child = command.spawn().expect("failed to spawn interactive session");
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    child
        .wait_with_output()
        .expect("failed to read interactive output")
}

fn row(id: i64, owner: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "task_name": "Vacuum",
        "assigned_to": owner,
        "room": "Living Room",
        "frequency": "Weekly",
        "description": null,
        "status": "pending",
        "due_date": null,
        "created_at": "2026-01-10T08:00:00",
        "completed_at": null
    })
}

#[test]
fn interactive_help_shows_usage() {
    let server = mockito::Server::new();
    let output = run_interactive(Some(&server), "help\nexit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_question_mark_shows_usage() {
    let server = mockito::Server::new();
    let output = run_interactive(Some(&server), "?\nquit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_invalid_command_prints_error_and_continues() {
    let server = mockito::Server::new();
    let output = run_interactive(Some(&server), "nope\nhelp\nexit\n");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_without_credentials_exits_with_config_missing() {
    let output = run_interactive(None, "help\nexit\n");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: config_missing"));
}

#[test]
fn interactive_rejects_config_override() {
    let server = mockito::Server::new();
    let output = run_interactive(Some(&server), "setup sql --config-override table=x\nexit\n");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--config-override is only read when rota starts"));
}

#[test]
fn interactive_edit_form_opens_and_cancels() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/rest/v1/cleaning_tasks")
        .match_query(mockito::Matcher::UrlEncoded("id".into(), "eq.4".into()))
        .with_status(200)
        .with_body(serde_json::json!([row(4, "Yvonne")]).to_string())
        .create();

    let output = run_interactive(Some(&server), "edit 4\ncancel 4\ncancel 4\nexit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Editing #4"));
    assert!(stdout.contains("Closed edit form for #4"));
    assert!(stdout.contains("No edit form open for #4"));
}

#[test]
fn interactive_store_error_does_not_end_session() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/rest/v1/cleaning_tasks")
        .match_query(mockito::Matcher::Any)
        .with_status(503)
        .with_body("down")
        .create();

    let output = run_interactive(Some(&server), "list\nsetup sql\nexit\n");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: store_unavailable"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CREATE TABLE IF NOT EXISTS cleaning_tasks"));
}

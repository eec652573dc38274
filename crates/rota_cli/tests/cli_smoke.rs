use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("rota-{nanos}-{file_name}"))
}

fn rota_without_credentials() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_rota"));
    command
        .env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_KEY")
        .env("ROTA_CONFIG_PATH", temp_path("missing-config.json"));
    command
}

#[test]
fn cli_smoke_help() {
    let output = rota_without_credentials()
        .arg("--help")
        .output()
        .expect("failed to run rota --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("dashboard"));
    assert!(stdout.contains("reconcile"));
}

#[test]
fn missing_credentials_exit_with_config_missing() {
    let output = rota_without_credentials()
        .arg("list")
        .output()
        .expect("failed to run rota list");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: config_missing"));
    assert!(stderr.contains("SUPABASE_URL"));
}

#[test]
fn blank_key_counts_as_missing() {
    let output = rota_without_credentials()
        .env("SUPABASE_URL", "http://127.0.0.1:9")
        .env("SUPABASE_KEY", "   ")
        .arg("dashboard")
        .output()
        .expect("failed to run rota dashboard");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: config_missing"));
    assert!(stderr.contains("SUPABASE_KEY"));
}

#[test]
fn setup_sql_works_without_credentials() {
    let output = rota_without_credentials()
        .args(["setup", "sql", "--config-override", "table=chores"])
        .output()
        .expect("failed to run rota setup sql");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CREATE TABLE IF NOT EXISTS chores"));
}

#[test]
fn unknown_override_is_rejected() {
    let output = rota_without_credentials()
        .args(["setup", "sql", "--config-override", "colour=red"])
        .output()
        .expect("failed to run rota setup sql");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn broken_config_file_falls_back_to_defaults() {
    let config_path = temp_path("broken-config.json");
    std::fs::write(&config_path, "{ not json").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_rota"))
        .env("ROTA_CONFIG_PATH", &config_path)
        .args(["setup", "sql"])
        .output()
        .expect("failed to run rota setup sql");
    std::fs::remove_file(&config_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CREATE TABLE IF NOT EXISTS cleaning_tasks"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file ignored"));
}

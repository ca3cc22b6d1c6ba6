use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("weekly-{nanos}-{file_name}"))
}

fn run_interactive_with_config(input: &str, config_path: &PathBuf) -> std::process::Output {
    let store_path = temp_path("cli-interactive.json");

    let mut child = Command::new(env!("CARGO_BIN_EXE_weekly"))
        .env("WEEKLY_STORE_PATH", &store_path)
        .env("WEEKLY_CONFIG_PATH", config_path)
        .env("WEEKLY_TODAY", "2026-10-16")
        .env("WEEKLY_DISABLE_NOTIFICATIONS", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    let output = child
        .wait_with_output()
        .expect("failed to read interactive output");

    std::fs::remove_file(&store_path).ok();
    output
}

fn run_interactive(input: &str) -> std::process::Output {
    run_interactive_with_config(input, &temp_path("no-config.json"))
}

#[test]
fn interactive_help_shows_usage() {
    let output = run_interactive("help\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_question_mark_shows_usage() {
    let output = run_interactive("?\nquit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_session_resets_once_on_first_run() {
    let output = run_interactive("list\nlist\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("New week!").count(), 1);
    assert_eq!(stdout.matches("Go for a walk").count(), 2);
}

#[test]
fn interactive_invalid_command_prints_error() {
    let output = run_interactive("nope\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn interactive_errors_do_not_end_session() {
    let output = run_interactive("check task-missing\nadd \"still here\"\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stderr.contains("ERROR: not_found"));
    assert!(stdout.contains("Added task: still here"));
}

#[test]
fn interactive_add_command_succeeds() {
    let output = run_interactive("add \"demo task\" --link calendar\nlist\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added task: demo task"));
    assert!(stdout.contains("Calendar"));
}

#[test]
fn interactive_alias_from_config_expands() {
    let config_path = temp_path("alias-config.json");
    std::fs::write(&config_path, r#"{"aliases":{"done":"check"}}"#).unwrap();

    let output = run_interactive_with_config("done 3\nexit\n", &config_path);
    std::fs::remove_file(&config_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Checked task: Go for a walk"));
    assert!(stdout.contains("1 of 3 done"));
}

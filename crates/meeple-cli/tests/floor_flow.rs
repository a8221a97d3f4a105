//! End-to-end tests for the floor workflow.
//!
//! Runs the binary the way staff would: register a table, book slots,
//! seat a walk-in, read the board, check the party out.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn meeple_binary() -> String {
    env!("CARGO_BIN_EXE_meeple").to_string()
}

/// Writes a config pointing at a database inside the temp dir.
fn write_config(temp: &Path) -> PathBuf {
    let db_file = temp.join("meeple.db");
    let config_file = temp.join("config.toml");
    std::fs::write(
        &config_file,
        format!(r#"database_path = "{}""#, db_file.display()),
    )
    .unwrap();
    config_file
}

fn run_meeple(config_file: &Path, args: &[&str]) -> Output {
    Command::new(meeple_binary())
        .arg("--config")
        .arg(config_file)
        .args(args)
        .output()
        .expect("failed to run meeple")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_full_floor_flow() {
    let temp = TempDir::new().unwrap();
    let config_file = write_config(temp.path());

    // Register a table and keep its generated id.
    let output = run_meeple(
        &config_file,
        &["tables", "add", "--venue", "cafe", "--label", "Window 2"],
    );
    let table_id = stdout_of(&output).trim().to_string();
    assert!(!table_id.is_empty(), "tables add should print the new id");

    // Two back-to-back bookings come through clean.
    let output = run_meeple(
        &config_file,
        &[
            "reserve",
            "--venue",
            "cafe",
            "--table",
            &table_id,
            "--date",
            "2030-01-15",
            "--start",
            "18:00",
            "--end",
            "19:30",
            "--party",
            "4",
        ],
    );
    let stdout = stdout_of(&output);
    assert!(!stdout.contains("warning"), "no overlap yet: {stdout}");

    let output = run_meeple(
        &config_file,
        &[
            "reserve",
            "--venue",
            "cafe",
            "--table",
            &table_id,
            "--date",
            "2030-01-15",
            "--start",
            "19:30",
            "--end",
            "21:00",
            "--party",
            "2",
        ],
    );
    let stdout = stdout_of(&output);
    assert!(
        !stdout.contains("warning"),
        "shared boundary is not an overlap: {stdout}"
    );

    // A pending hold across both slots is taken, but flagged twice.
    let output = run_meeple(
        &config_file,
        &[
            "reserve",
            "--venue",
            "cafe",
            "--table",
            &table_id,
            "--date",
            "2030-01-15",
            "--start",
            "19:00",
            "--end",
            "20:00",
            "--party",
            "5",
            "--pending",
            "--guest",
            "Sam, 555-0199",
        ],
    );
    let stdout = stdout_of(&output);
    assert_eq!(
        stdout.matches("warning: overlaps").count(),
        2,
        "pending hold should collide with both bookings: {stdout}"
    );
    assert!(stdout.contains("by 30m"), "both overlaps are 30m: {stdout}");

    // Seat a walk-in party.
    let output = run_meeple(
        &config_file,
        &["checkin", "--venue", "cafe", "--table", &table_id],
    );
    let session_id = stdout_of(&output).trim().to_string();
    assert!(!session_id.is_empty(), "checkin should print the session id");

    // The board sees the occupant and both double-bookings.
    let output = run_meeple(
        &config_file,
        &[
            "floor",
            "--venue",
            "cafe",
            "--date",
            "2030-01-15",
            "--json",
        ],
    );
    let board: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(board["venue_id"], "cafe");
    assert_eq!(board["date"], "2030-01-15");
    let tables = board["tables"].as_object().unwrap();
    assert_eq!(tables.len(), 1, "one registered table");
    let status = &tables[&table_id];
    assert_eq!(status["occupant"]["session"]["id"], session_id.as_str());
    assert_eq!(status["occupant"]["has_duplicates"], false);
    assert_eq!(status["conflicts"].as_array().unwrap().len(), 2);
    assert!(
        status["risk"].is_null(),
        "bookings years out are beyond the risk lookahead"
    );

    // Check the party out; the table reads free again.
    let output = run_meeple(&config_file, &["checkout", "--session", &session_id]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains(&session_id), "checkout echoes the session");

    let output = run_meeple(
        &config_file,
        &[
            "floor",
            "--venue",
            "cafe",
            "--date",
            "2030-01-15",
            "--json",
        ],
    );
    let board: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert!(board["tables"][&table_id]["occupant"].is_null());

    // The floor plan listing shows the table.
    let output = run_meeple(&config_file, &["tables", "list", "--venue", "cafe"]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains(&table_id));
    assert!(stdout.contains("Window 2"));
}

#[test]
fn test_checkin_unknown_table_fails() {
    let temp = TempDir::new().unwrap();
    let config_file = write_config(temp.path());

    let output = run_meeple(
        &config_file,
        &["checkin", "--venue", "cafe", "--table", "no-such-table"],
    );
    assert!(!output.status.success(), "unknown table should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("table not found"),
        "should name the problem: {stderr}"
    );
}

#[test]
fn test_no_subcommand_prints_help() {
    let output = Command::new(meeple_binary())
        .output()
        .expect("failed to run meeple");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Board-game cafe floor operations"));
}

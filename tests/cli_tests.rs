//! Integration tests for the lifeorg CLI
//!
//! These drive the built binary: argument parsing, the one-shot mode up to
//! the API key check, and the interactive session through piped stdin.

use std::fs;

mod common;

use common::{TestConfig, has_api_key, stderr_of, stdout_of};

#[test]
fn test_help_output() {
    let config = TestConfig::new();
    let output = config
        .command()
        .arg("--help")
        .output()
        .expect("Failed to execute lifeorg --help");

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Personal task organizer using Google Gemini API"));
    assert!(stdout.contains("--image"));
    assert!(stdout.contains("--record-audio"));
    assert!(stdout.contains("--plan"));
    assert!(stdout.contains("--thinking-budget"));
}

#[test]
fn test_version_output() {
    let config = TestConfig::new();
    let output = config
        .command()
        .arg("--version")
        .output()
        .expect("Failed to execute lifeorg --version");

    assert!(output.status.success());
    assert!(stdout_of(&output).contains("lifeorg"));
}

#[test]
fn test_prompt_without_api_key() {
    let config = TestConfig::new();
    let output = config
        .command()
        .arg("Book dentist for Tuesday")
        .output()
        .expect("Failed to execute lifeorg");

    assert!(!output.status.success());
    let stderr = stderr_of(&output);
    assert!(stderr.contains("GEMINI_API_KEY"));
    assert!(stderr.contains("API Key Required"));
}

#[test]
fn test_image_without_api_key() {
    let config = TestConfig::new();
    let image_path = config.create_test_image("whiteboard.png");

    let output = config
        .command()
        .arg("-i")
        .arg(&image_path)
        .output()
        .expect("Failed to execute lifeorg with image input");

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("GEMINI_API_KEY"));
}

#[test]
fn test_invalid_theme_rejected() {
    let config = TestConfig::new();
    let output = config
        .command()
        .args(["--theme", "sepia"])
        .output()
        .expect("Failed to execute lifeorg");

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("sepia"));
}

#[test]
fn test_session_lists_sample_tasks() {
    let config = TestConfig::new();
    let output = config.run_session(&[], &["/list", "/quit"]);

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Review quarterly budget"));
    assert!(stdout.contains("Grocery shopping"));
    assert!(stdout.contains("Client meeting preparation"));
    assert!(stdout.contains("2 active, 1 completed"));
    assert!(stdout.contains("Goodbye!"));
}

#[test]
fn test_session_ends_on_eof() {
    let config = TestConfig::new();
    let output = config.run_session(&["--no-samples"], &[]);

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("No tasks yet"));
    assert!(stdout.contains("Goodbye!"));
}

#[test]
fn test_session_toggle_and_delete() {
    let config = TestConfig::new();
    let output = config.run_session(&[], &["/done 2", "/delete 1", "/done 9", "/quit"]);

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    // after /done 2
    assert!(stdout.contains("1 active, 2 completed"));
    // after /delete 1
    assert!(stdout.contains("0 active, 2 completed"));
    assert!(stdout.contains("No task #9"));
}

#[test]
fn test_session_plan_without_active_tasks() {
    let config = TestConfig::new();
    let output = config.run_session(&["--no-samples"], &["/plan", "/show-plan", "/quit"]);

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("No active tasks to plan! Add some tasks first."));
    assert!(stdout.contains("No plan yet"));
}

#[test]
fn test_session_submission_without_api_key() {
    let config = TestConfig::new();
    let output = config.run_session(
        &[],
        &["Book dentist for Tuesday", "/status", "/dismiss", "/quit"],
    );

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Something went wrong processing your input. Please try again."));
    // the failed text stays staged
    assert!(stdout.contains("Staged text:      Book dentist for Tuesday"));
    assert!(stderr_of(&output).contains("GEMINI_API_KEY"));
}

#[test]
fn test_session_theme_is_persisted() {
    let config = TestConfig::new();
    let output = config.run_session(&[], &["/theme dark", "/quit"]);

    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Theme: dark"));

    let settings = fs::read_to_string(config.settings_path()).expect("settings written");
    let value: serde_json::Value = serde_json::from_str(&settings).unwrap();
    assert_eq!(value["theme"], "dark");

    let output = config.run_session(&[], &["/status", "/quit"]);
    assert!(stdout_of(&output).contains("Theme:            dark"));
}

#[test]
fn test_theme_flag_is_persisted() {
    let config = TestConfig::new();
    let output = config.run_session(&["--theme", "light"], &["/quit"]);

    assert!(output.status.success());
    let settings = fs::read_to_string(config.settings_path()).expect("settings written");
    assert!(settings.contains("light"));
}

#[test]
fn test_session_image_errors_are_reported() {
    let config = TestConfig::new();
    let output = config.run_session(
        &[],
        &["/image notes.txt", "/image", "/clear-image", "/stop", "/quit"],
    );

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Unsupported image format"));
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("No image attached."));
    assert!(stdout.contains("Not recording."));
}

#[test]
fn test_session_unknown_command() {
    let config = TestConfig::new();
    let output = config.run_session(&[], &["/frobnicate", "/quit"]);

    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Unknown command: /frobnicate"));
}

// Tests that require actual API keys - only run if available
#[test]
#[ignore] // Use `cargo test -- --ignored` to run these
fn test_gemini_extraction_integration() {
    if !has_api_key() {
        eprintln!("Skipping test: GEMINI_API_KEY not set");
        return;
    }

    let config = TestConfig::new();
    let output = config
        .command()
        .env("GEMINI_API_KEY", std::env::var("GEMINI_API_KEY").unwrap())
        .args(["--no-samples", "Book a dentist appointment for Tuesday"])
        .output()
        .expect("Failed to execute lifeorg with API");

    if output.status.success() {
        assert!(stdout_of(&output).to_lowercase().contains("dentist"));
    } else {
        // API might be rate limited or temporarily unavailable
        eprintln!("API test failed: {}", stderr_of(&output));
    }
}

//! Common utilities for lifeorg CLI integration tests

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Isolated home directory plus the binary under test
pub struct TestConfig {
    pub temp_dir: TempDir,
    pub binary: PathBuf,
}

impl TestConfig {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            temp_dir,
            binary: PathBuf::from(env!("CARGO_BIN_EXE_lifeorg")),
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn settings_path(&self) -> PathBuf {
        self.temp_path().join(".lifeorg").join("settings.json")
    }

    /// Create a minimal PNG file (1x1 pixel, white) and return its path
    pub fn create_test_image(&self, name: &str) -> PathBuf {
        let png_data = [
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
            0x00, 0x00, 0x00, 0x0D, // IHDR chunk length
            0x49, 0x48, 0x44, 0x52, // IHDR chunk type
            0x00, 0x00, 0x00, 0x01, // Width: 1
            0x00, 0x00, 0x00, 0x01, // Height: 1
            0x08, 0x02, 0x00, 0x00, 0x00, // Bit depth, color type, compression, filter, interlace
            0x90, 0x77, 0x53, 0xDE, // IHDR CRC
            0x00, 0x00, 0x00, 0x0C, // IDAT chunk length
            0x49, 0x44, 0x41, 0x54, // IDAT chunk type
            0x08, 0x99, 0x01, 0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x02, 0x00,
            0x01, // IDAT data + CRC
            0x00, 0x00, 0x00, 0x00, // IEND chunk length
            0x49, 0x45, 0x4E, 0x44, // IEND chunk type
            0xAE, 0x42, 0x60, 0x82, // IEND CRC
        ];

        let file_path = self.temp_path().join(name);
        fs::write(&file_path, png_data).expect("Failed to write test image");
        file_path
    }

    /// A command with a private HOME, no API key, and no colors
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .env("HOME", self.temp_path())
            .env("NO_COLOR", "1")
            .env_remove("GEMINI_API_KEY")
            .env_remove("RUST_LOG")
            .env_remove("COLORFGBG")
            .env_remove("LIFEORG_LOG_TO_FILE");
        command
    }

    /// Run an interactive session fed from `lines`
    pub fn run_session(&self, args: &[&str], lines: &[&str]) -> Output {
        let mut child = self
            .command()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to start lifeorg");

        {
            let mut stdin = child.stdin.take().expect("stdin is piped");
            for line in lines {
                writeln!(stdin, "{line}").expect("Failed to write to stdin");
            }
        }

        child.wait_with_output().expect("Failed to wait for lifeorg")
    }
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Check if we have a valid API key for testing
pub fn has_api_key() -> bool {
    env::var("GEMINI_API_KEY").is_ok()
}

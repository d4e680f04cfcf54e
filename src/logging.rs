use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::constants::APP_DIR_NAME;

static LOG_FILE: Mutex<Option<std::fs::File>> = Mutex::new(None);

/// Initialize logging system
/// - Console logging is ONLY enabled when RUST_LOG is set, and goes to stderr
///   so it never interleaves with rendered task lists on stdout
/// - File logging is enabled when LIFEORG_LOG_TO_FILE is set (see `setup_session_file_logging`)
pub fn init_logging() {
    let rust_log_present = env::var("RUST_LOG").is_ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if rust_log_present {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(env_filter).init();
    }
}

/// Mirror log lines into `~/.lifeorg/logs/<session_id>.log`
pub fn setup_session_file_logging(session_id: &str) -> anyhow::Result<()> {
    if env::var("LIFEORG_LOG_TO_FILE").is_err() {
        return Ok(());
    }

    let logs_dir = get_logs_dir()?;
    if !logs_dir.exists() {
        std::fs::create_dir_all(&logs_dir)?;
    }

    let log_file_path = logs_dir.join(format!("{session_id}.log"));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(file);
    }

    log_info(&format!(
        "File logging enabled: {}",
        log_file_path.display()
    ));

    Ok(())
}

fn get_logs_dir() -> anyhow::Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    Ok(home_dir.join(APP_DIR_NAME).join("logs"))
}

fn write_to_file(level: &str, msg: &str) {
    if let Ok(mut guard) = LOG_FILE.lock()
        && let Some(ref mut file) = *guard
    {
        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(file, "[{timestamp}] [{level}] [lifeorg] {msg}");
        let _ = file.flush();
    }
}

pub fn log_error(msg: &str) {
    error!("{msg}");
    write_to_file("ERROR", msg);
}

pub fn log_warn(msg: &str) {
    warn!("{msg}");
    write_to_file("WARN", msg);
}

pub fn log_info(msg: &str) {
    info!("{msg}");
    write_to_file("INFO", msg);
}

pub fn log_debug(msg: &str) {
    debug!("{msg}");
    write_to_file("DEBUG", msg);
}

pub fn log_trace(msg: &str) {
    trace!("{msg}");
    write_to_file("TRACE", msg);
}

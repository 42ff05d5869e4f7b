use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use anyhow::{Context, Result};
use chrono::Local;

static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

struct Logger {
    file: File,
    echo: bool,
    prefixes: HashMap<String, u8>, // prefix -> ANSI color
}

// ANSI foreground colors used when echoing to stderr
pub const COLOR_GRAY: u8 = 90;
pub const COLOR_BLUE: u8 = 34;
pub const COLOR_CYAN: u8 = 36;

/// Initialize the global logger. Clears the log file.
pub fn init(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log dir {}", log_dir.display()))?;
    let log_path = log_dir.join("app.log");
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    LOGGER
        .set(Mutex::new(Logger { file, echo: false, prefixes: HashMap::new() }))
        .ok();
    Ok(())
}

/// Mirror every line to stderr.
pub fn set_echo(echo: bool) {
    if let Some(logger) = LOGGER.get() {
        if let Ok(mut l) = logger.lock() {
            l.echo = echo;
        }
    }
}

/// Register a prefix with a color. All subsequent `*_p` calls with this
/// prefix use that color on stderr.
pub fn register_prefix(prefix: &str, color: u8) {
    if let Some(logger) = LOGGER.get() {
        if let Ok(mut l) = logger.lock() {
            l.prefixes.insert(prefix.to_string(), color);
        }
    }
}

fn write_log(level: &str, prefix: &str, msg: &str) {
    let Some(logger) = LOGGER.get() else { return };
    let Ok(mut l) = logger.lock() else { return };

    let ts = Local::now().format("%H:%M:%S%.3f").to_string();

    // File always gets plain text
    let file_line = if prefix.is_empty() {
        format!("[{}] [{}] {}", ts, level, msg)
    } else {
        format!("[{}] [{}] [{}] {}", ts, level, prefix, msg)
    };
    writeln!(l.file, "{}", file_line).ok();

    if l.echo {
        let color = l.prefixes.get(prefix).copied().unwrap_or(0);
        if prefix.is_empty() || color == 0 {
            eprintln!("{}", file_line);
        } else {
            eprintln!("[{}] [{}] \x1b[{}m[{}]\x1b[0m {}", ts, level, color, prefix, msg);
        }
    }
}

pub fn info(msg: &str) {
    write_log("INFO", "", msg);
}

pub fn warn(msg: &str) {
    write_log("WARN", "", msg);
}

pub fn error(msg: &str) {
    write_log("ERROR", "", msg);
}

/// Log with a registered prefix.
pub fn info_p(prefix: &str, msg: &str) {
    write_log("INFO", prefix, msg);
}

pub fn warn_p(prefix: &str, msg: &str) {
    write_log("WARN", prefix, msg);
}

pub fn error_p(prefix: &str, msg: &str) {
    write_log("ERROR", prefix, msg);
}

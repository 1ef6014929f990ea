//! Structured logging module for Chatter's Guild
//!
//! Writes logs to ~/.chatter_guild/logs/ with categories:
//! - SCORING: Per-turn behavior and Insight Point results
//! - MATCH: Musical Chairs role shifts, round results, tie-breaks
//! - PROFILE: Profile load/save and level changes
//! - PARTNER: AI partner replies and LLM fallbacks
//! - SESSION: Training session lifecycle
//! - ERROR: Recoverable failures

use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Log categories for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Scoring,
    Match,
    Profile,
    Partner,
    Session,
    Error,
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Scoring => "SCORING",
            LogCategory::Match => "MATCH",
            LogCategory::Profile => "PROFILE",
            LogCategory::Partner => "PARTNER",
            LogCategory::Session => "SESSION",
            LogCategory::Error => "ERROR",
        }
    }
}

/// Log directory, set by `init_logging`. Nothing is written to disk before that.
static LOG_DIR: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(None));

/// Root data directory shared by logs and the default profile location
pub fn data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".chatter_guild")
}

fn default_log_dir() -> PathBuf {
    data_dir().join("logs")
}

fn log_file_path(dir: &std::path::Path) -> PathBuf {
    let today = Local::now().format("%Y-%m-%d").to_string();
    dir.join(format!("chatter-guild-{}.log", today))
}

/// Initialize the logging system in the default directory
pub fn init_logging() -> std::io::Result<()> {
    init_logging_in(default_log_dir())
}

/// Initialize the logging system in a specific directory
pub fn init_logging_in(log_dir: PathBuf) -> std::io::Result<()> {
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }

    if let Ok(mut guard) = LOG_DIR.lock() {
        *guard = Some(log_dir);
    }

    log(LogCategory::Session, None, "Chatter's Guild logging initialized");
    Ok(())
}

/// Format one log line. Context ids are shortened to 8 characters.
pub fn format_line(category: LogCategory, context_id: Option<&str>, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let context = context_id
        .map(|id| format!("session={} | ", id.chars().take(8).collect::<String>()))
        .unwrap_or_default();

    format!(
        "[{}] [{}] {}{}\n",
        timestamp,
        category.as_str(),
        context,
        message
    )
}

/// Log a message with category and optional session/match context
pub fn log(category: LogCategory, context_id: Option<&str>, message: &str) {
    let line = format_line(category, context_id, message);

    if cfg!(debug_assertions) {
        eprint!("{}", line);
    }

    let dir = match LOG_DIR.lock() {
        Ok(guard) => guard.clone(),
        Err(_) => None,
    };

    if let Some(dir) = dir {
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_path(&dir))
        {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

pub fn log_scoring(context_id: Option<&str>, message: &str) {
    log(LogCategory::Scoring, context_id, message);
}

pub fn log_match(context_id: Option<&str>, message: &str) {
    log(LogCategory::Match, context_id, message);
}

pub fn log_profile(context_id: Option<&str>, message: &str) {
    log(LogCategory::Profile, context_id, message);
}

pub fn log_partner(context_id: Option<&str>, message: &str) {
    log(LogCategory::Partner, context_id, message);
}

pub fn log_session(context_id: Option<&str>, message: &str) {
    log(LogCategory::Session, context_id, message);
}

pub fn log_error(context_id: Option<&str>, message: &str) {
    log(LogCategory::Error, context_id, message);
}

/// Clean up old log files (keep last 7 days)
pub fn cleanup_old_logs() -> std::io::Result<usize> {
    let log_dir = match LOG_DIR.lock() {
        Ok(guard) => guard.clone().unwrap_or_else(default_log_dir),
        Err(_) => default_log_dir(),
    };
    let mut deleted = 0;

    if !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(7);

    for entry in fs::read_dir(&log_dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Ok(metadata) = entry.metadata() {
            if let Ok(modified) = metadata.modified() {
                let modified_time: chrono::DateTime<Utc> = modified.into();
                if modified_time < cutoff && fs::remove_file(&path).is_ok() {
                    deleted += 1;
                }
            }
        }
    }

    Ok(deleted)
}

/// Structured logging for the surge warning pipeline
///
/// Provides context-rich logging with pipeline-stage and region
/// identifiers, timestamps, and severity levels. Supports both console
/// output and file-based logging for batch runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::alert::neighbors::CACHE_EXTENSION;
use crate::model::SurgeError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses a config-file level name (case-insensitive).
    pub fn parse(name: &str) -> Option<LogLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Mesh,
    Boundaries,
    Warnings,
    Neighbors,
    Onset,
    Render,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Mesh => write!(f, "MESH"),
            Stage::Boundaries => write!(f, "BOUNDS"),
            Stage::Warnings => write!(f, "WARN"),
            Stage::Neighbors => write!(f, "NBR"),
            Stage::Onset => write!(f, "ONSET"),
            Stage::Render => write!(f, "RENDER"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - e.g. a cache file that has not been built yet
    Expected,
    /// Unexpected failure - unreadable or corrupt primary input
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, stage: &Stage, region: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let region_part = region.map(|r| format!(" [{}]", r)).unwrap_or_default();
        let log_entry = format!("{} {} {}{}: {}", timestamp, level, stage, region_part, message);

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, region_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, region_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, stage: Stage, region: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &stage, region, message);
        }
    }
}

/// Log a general informational message
pub fn info(stage: Stage, region: Option<&str>, message: &str) {
    emit(LogLevel::Info, stage, region, message);
}

/// Log a warning message
pub fn warn(stage: Stage, region: Option<&str>, message: &str) {
    emit(LogLevel::Warning, stage, region, message);
}

/// Log an error message
pub fn error(stage: Stage, region: Option<&str>, message: &str) {
    emit(LogLevel::Error, stage, region, message);
}

/// Log a debug message
pub fn debug(stage: Stage, region: Option<&str>, message: &str) {
    emit(LogLevel::Debug, stage, region, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a pipeline error by how surprising it is for a batch run
pub fn classify_failure(err: &SurgeError) -> FailureType {
    match err {
        // The neighbor cache is built on first use
        SurgeError::Io { path, source }
            if source.kind() == std::io::ErrorKind::NotFound
                && path.extension().is_some_and(|ext| ext == CACHE_EXTENSION) =>
        {
            FailureType::Expected
        }
        // A missing file is usually a mistyped path in the config
        SurgeError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            FailureType::Unknown
        }
        SurgeError::Io { .. } => FailureType::Unexpected,
        SurgeError::Malformed { .. } | SurgeError::Inconsistent(_) => FailureType::Unexpected,
        SurgeError::EmptyGeometry(_) => FailureType::Unknown,
        SurgeError::Config(_) => FailureType::Unexpected,
    }
}

/// Log a stage failure with automatic classification
pub fn log_failure(stage: Stage, region: Option<&str>, operation: &str, err: &SurgeError) {
    let failure_type = classify_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => debug(stage, region, &message),
        FailureType::Unexpected => error(stage, region, &message),
        FailureType::Unknown => warn(stage, region, &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one region-evaluation pass
pub fn log_evaluation_summary(total: usize, warned: usize, notified: usize, skipped: usize) {
    let message = format!(
        "Evaluation complete: {} regions, {} warned, {} notified, {} without nearby nodes",
        total, warned, notified, skipped
    );

    if skipped == 0 {
        info(Stage::Warnings, None, &message);
    } else if warned + notified == 0 {
        error(Stage::Warnings, None, &message);
    } else {
        warn(Stage::Warnings, None, &message);
    }
}

//! Logging bootstrap.
//!
//! # Responsibility
//! - Initialize the process logger exactly once from a typed config.
//! - Keep core diagnostics on the `log` facade with `event=... module=...`
//!   key/value messages.
//!
//! # Invariants
//! - Initialization is idempotent for an identical config.
//! - Re-initialization with a different config is rejected.
//! - Initialization never panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "objext";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    config: ResolvedConfig,
    _logger: LoggerHandle,
}

/// Logger settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rotated log files; stderr when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedConfig {
    level: &'static str,
    log_dir: Option<PathBuf>,
}

/// Initializes the process logger.
///
/// # Errors
/// - Unsupported level, relative `log_dir`, unwritable directory.
/// - Logging already initialized with a different config.
pub fn init_logging(config: &LoggingConfig) -> Result<(), String> {
    let resolved = resolve(config)?;

    if let Some(state) = LOGGING_STATE.get() {
        return ensure_same(&state.config, &resolved);
    }

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        let logger = Logger::try_with_str(resolved.level)
            .map_err(|err| format!("invalid log level `{}`: {err}", resolved.level))?;

        let logger = match &resolved.log_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|err| {
                    format!("failed to create log directory `{}`: {err}", dir.display())
                })?;
                logger
                    .log_to_file(
                        FileSpec::default()
                            .directory(dir.as_path())
                            .basename(LOG_FILE_BASENAME),
                    )
                    .rotate(
                        Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                        Naming::Numbers,
                        Cleanup::KeepLogFiles(MAX_LOG_FILES),
                    )
                    .write_mode(WriteMode::BufferAndFlush)
                    .append()
                    .format_for_files(flexi_logger::detailed_format)
            }
            None => logger.log_to_stderr(),
        };

        let handle = logger
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        info!(
            "event=logging_init module=core status=ok level={} sink={} version={}",
            resolved.level,
            sink_label(&resolved),
            env!("CARGO_PKG_VERSION")
        );

        Ok(LoggingState {
            config: resolved.clone(),
            _logger: handle,
        })
    })?;

    ensure_same(&state.config, &resolved)
}

/// Returns `(level, log_dir)` once logging is active.
pub fn logging_status() -> Option<(&'static str, Option<PathBuf>)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.config.level, state.config.log_dir.clone()))
}

/// `debug` in debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn resolve(config: &LoggingConfig) -> Result<ResolvedConfig, String> {
    Ok(ResolvedConfig {
        level: normalize_level(&config.level)?,
        log_dir: config
            .log_dir
            .as_deref()
            .map(normalize_log_dir)
            .transpose()?,
    })
}

fn ensure_same(active: &ResolvedConfig, requested: &ResolvedConfig) -> Result<(), String> {
    if active == requested {
        return Ok(());
    }
    Err(format!(
        "logging already initialized with level `{}` sink `{}`; refusing to switch to level `{}` sink `{}`",
        active.level,
        sink_label(active),
        requested.level,
        sink_label(requested)
    ))
}

fn sink_label(config: &ResolvedConfig) -> String {
    match &config.log_dir {
        Some(dir) => dir.display().to_string(),
        None => "stderr".to_string(),
    }
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn normalize_log_dir(log_dir: &Path) -> Result<PathBuf, String> {
    if log_dir.as_os_str().is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    if !log_dir.is_absolute() {
        return Err(format!(
            "log_dir must be an absolute path, got `{}`",
            log_dir.display()
        ));
    }
    Ok(log_dir.to_path_buf())
}

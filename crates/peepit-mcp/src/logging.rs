//! Log destination selection and subscriber setup
//!
//! Logs are written as JSON lines to a file. The preferred location is
//! `PEEPIT_LOG_FILE` or the platform log directory; before using it the
//! directory is created and a marker file written and removed. If any of that
//! fails the temp-directory fallback is used instead. Logging problems never
//! stop the server from starting.
//!
//! stdout carries the protocol, so the optional console mirror goes to stderr.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use uuid::Uuid;

use crate::config::{
    EnvSource, PEEPIT_CONSOLE_LOGGING, PEEPIT_LOG_FILE, PEEPIT_LOG_LEVEL, expand_home,
};

const LOG_FILE_NAME: &str = "peepit-mcp.log";

/// Minimum severity accepted by `PEEPIT_LOG_LEVEL`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Same threshold as `Error`; there is no separate fatal level
    Fatal,
    Silent,
}

impl LogLevel {
    /// Case-insensitive parse; unknown or missing values mean `Info`
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("trace") => LogLevel::Trace,
            Some("debug") => LogLevel::Debug,
            Some("info") => LogLevel::Info,
            Some("warn") => LogLevel::Warn,
            Some("error") => LogLevel::Error,
            Some("fatal") => LogLevel::Fatal,
            Some("silent") => LogLevel::Silent,
            _ => LogLevel::Info,
        }
    }

    pub fn filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Fatal => LevelFilter::ERROR,
            LogLevel::Silent => LevelFilter::OFF,
        }
    }
}

/// Where and how to log; fixed for the process lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTransportConfig {
    pub primary_path: PathBuf,
    pub fallback_path: PathBuf,
    pub min_level: LogLevel,
    pub console_enabled: bool,
}

impl LogTransportConfig {
    pub fn from_env(env: &dyn EnvSource) -> Self {
        Self {
            primary_path: env
                .non_empty(PEEPIT_LOG_FILE)
                .map(|path| expand_home(&path))
                .unwrap_or_else(default_log_path),
            fallback_path: fallback_log_path(),
            min_level: LogLevel::parse(env.var(PEEPIT_LOG_LEVEL).as_deref()),
            console_enabled: env.var(PEEPIT_CONSOLE_LOGGING).as_deref() == Some("true"),
        }
    }
}

/// Platform log location
///
/// `~/Library/Logs` on macOS, the XDG state (or local data) directory
/// elsewhere.
pub fn default_log_path() -> PathBuf {
    let platform = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|home| home.join("Library").join("Logs").join(LOG_FILE_NAME))
    } else {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .map(|dir| dir.join("peepit").join(LOG_FILE_NAME))
    };
    platform.unwrap_or_else(fallback_log_path)
}

pub fn fallback_log_path() -> PathBuf {
    std::env::temp_dir().join(LOG_FILE_NAME)
}

/// The log file actually in use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDestination {
    pub path: PathBuf,
    /// Why the primary path was rejected, if it was
    pub fallback_reason: Option<String>,
}

/// Create the parent directory and write then remove a marker file in it
fn check_writable(path: &Path) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let marker = dir.join(format!(".peepit-test-{}", Uuid::new_v4()));
    fs::write(&marker, b"")?;
    fs::remove_file(&marker)
}

/// Pick the primary path if it is writable, otherwise the fallback
pub fn resolve_destination(config: &LogTransportConfig) -> LogDestination {
    match check_writable(&config.primary_path) {
        Ok(()) => LogDestination {
            path: config.primary_path.clone(),
            fallback_reason: None,
        },
        Err(e) => LogDestination {
            path: config.fallback_path.clone(),
            fallback_reason: Some(format!("{}: {}", config.primary_path.display(), e)),
        },
    }
}

/// Keeps the background log writer alive
///
/// Dropping the handle (or calling [`LoggingHandle::flush`]) flushes
/// buffered records to the file.
pub struct LoggingHandle {
    destination: LogDestination,
    file_error: Option<String>,
    guard: Option<WorkerGuard>,
}

impl LoggingHandle {
    /// Path of the active log file, `None` if the file sink was dropped
    pub fn path(&self) -> Option<&Path> {
        self.guard.as_ref().map(|_| self.destination.path.as_path())
    }

    pub fn destination(&self) -> &LogDestination {
        &self.destination
    }

    /// Why the log file could not be opened, if it could not
    pub fn file_error(&self) -> Option<&str> {
        self.file_error.as_deref()
    }

    pub fn flush(self) {
        drop(self);
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Resolve the destination and open it for appending
///
/// A primary path that passes the writability check can still fail to open
/// (it may be a directory, for example); the fallback is tried before the
/// file sink is given up.
pub fn open_destination(config: &LogTransportConfig) -> (LogDestination, io::Result<File>) {
    let mut destination = resolve_destination(config);
    match open_append(&destination.path) {
        Err(e) if destination.path != config.fallback_path => {
            destination.fallback_reason = Some(format!("{}: {}", destination.path.display(), e));
            destination.path = config.fallback_path.clone();
            let file = open_append(&destination.path);
            (destination, file)
        }
        opened => (destination, opened),
    }
}

/// Install the global subscriber
///
/// If a subscriber is already installed the existing one is kept.
pub fn init(config: &LogTransportConfig) -> LoggingHandle {
    let (destination, opened) = open_destination(config);
    let (file_writer, guard, file_error) = match opened {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(writer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e.to_string())),
    };

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
    });
    let console_layer = config.console_enabled.then(|| {
        fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(io::stderr)
    });

    let _ = tracing_subscriber::registry()
        .with(config.min_level.filter())
        .with(file_layer)
        .with(console_layer)
        .try_init();

    if let Some(reason) = &destination.fallback_reason {
        tracing::warn!(
            reason = %reason,
            fallback = %destination.path.display(),
            "Primary log location not writable, using fallback"
        );
    }
    if let Some(error) = &file_error {
        tracing::warn!(path = %destination.path.display(), error = %error, "Log file unavailable, file logging disabled");
    }

    LoggingHandle {
        destination,
        file_error,
        guard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config_in(dir: &Path, primary: PathBuf) -> LogTransportConfig {
        LogTransportConfig {
            primary_path: primary,
            fallback_path: dir.join("fallback").join(LOG_FILE_NAME),
            min_level: LogLevel::Info,
            console_enabled: false,
        }
    }

    #[rstest]
    #[case(None, LogLevel::Info)]
    #[case(Some("DEBUG"), LogLevel::Debug)]
    #[case(Some(" warn "), LogLevel::Warn)]
    #[case(Some("Fatal"), LogLevel::Fatal)]
    #[case(Some("silent"), LogLevel::Silent)]
    #[case(Some("verbose"), LogLevel::Info)]
    fn test_log_level_parse(#[case] raw: Option<&str>, #[case] expected: LogLevel) {
        assert_eq!(LogLevel::parse(raw), expected);
    }

    #[test]
    fn test_fatal_and_silent_filters() {
        assert_eq!(LogLevel::Fatal.filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Silent.filter(), LevelFilter::OFF);
    }

    #[test]
    fn test_from_env() {
        let env: HashMap<String, String> = [
            (PEEPIT_LOG_FILE.to_string(), "/var/tmp/custom.log".to_string()),
            (PEEPIT_LOG_LEVEL.to_string(), "trace".to_string()),
            (PEEPIT_CONSOLE_LOGGING.to_string(), "true".to_string()),
        ]
        .into_iter()
        .collect();
        let config = LogTransportConfig::from_env(&env);
        assert_eq!(config.primary_path, PathBuf::from("/var/tmp/custom.log"));
        assert_eq!(config.min_level, LogLevel::Trace);
        assert!(config.console_enabled);
        assert_eq!(config.fallback_path, fallback_log_path());
    }

    #[test]
    fn test_console_requires_exact_true() {
        let env: HashMap<String, String> =
            [(PEEPIT_CONSOLE_LOGGING.to_string(), "1".to_string())].into_iter().collect();
        assert!(!LogTransportConfig::from_env(&env).console_enabled);
    }

    #[test]
    fn test_resolve_creates_directory_and_cleans_marker() {
        let temp = tempfile::tempdir().unwrap();
        let primary = temp.path().join("nested").join("logs").join(LOG_FILE_NAME);
        let config = config_in(temp.path(), primary.clone());

        let destination = resolve_destination(&config);

        assert_eq!(destination.path, primary);
        assert_eq!(destination.fallback_reason, None);
        let leftovers: Vec<_> = fs::read_dir(temp.path().join("nested").join("logs"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty(), "marker file should be removed");
    }

    #[test]
    fn test_resolve_falls_back_when_directory_cannot_be_created() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();
        let config = config_in(temp.path(), blocker.join("logs").join(LOG_FILE_NAME));

        let destination = resolve_destination(&config);

        assert_eq!(destination.path, config.fallback_path);
        assert!(destination.fallback_reason.is_some());
    }

    #[test]
    fn test_open_falls_back_when_primary_is_directory() {
        let temp = tempfile::tempdir().unwrap();
        let primary = temp.path().join("logs").join(LOG_FILE_NAME);
        fs::create_dir_all(&primary).unwrap();
        let config = config_in(temp.path(), primary.clone());

        let (destination, opened) = open_destination(&config);

        assert!(opened.is_ok());
        assert_eq!(destination.path, config.fallback_path);
        assert!(config.fallback_path.is_file());
        let reason = destination.fallback_reason.unwrap();
        assert!(reason.starts_with(&primary.display().to_string()), "{}", reason);
    }

    #[test]
    fn test_open_reports_error_when_fallback_also_fails() {
        let temp = tempfile::tempdir().unwrap();
        let primary = temp.path().join("primary.log");
        fs::create_dir_all(&primary).unwrap();
        let config = config_in(temp.path(), primary);
        fs::create_dir_all(&config.fallback_path).unwrap();

        let (destination, opened) = open_destination(&config);

        assert!(opened.is_err());
        assert_eq!(destination.path, config.fallback_path);
    }
}

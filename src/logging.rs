//! Structured logging setup using the `tracing` ecosystem.
//!
//! Records are written as JSON lines with an RFC 3339 timestamp. A console
//! sink is always attached; a file sink is added when a log file is
//! configured and can be opened for appending. Error-level records also
//! carry the caller's file, line and thread.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::LoggingConfig;

/// Maps a level name to a threshold. Unknown names mean `info`.
#[must_use]
pub fn parse_level(name: &str) -> LevelFilter {
    match name {
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

/// Opens a log file for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn is_located(metadata: &Metadata<'_>) -> bool {
    metadata.is_span() || *metadata.level() == Level::ERROR
}

fn is_plain(metadata: &Metadata<'_>) -> bool {
    metadata.is_span() || *metadata.level() != Level::ERROR
}

/// JSON layers for one sink: plain records, and error records with caller
/// location attached.
fn sink<S, W>(writer: W) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Clone + Send + Sync + 'static,
{
    let plain = fmt::layer()
        .json()
        .with_writer(writer.clone())
        .with_filter(filter_fn(is_plain));

    let located = fmt::layer()
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter_fn(is_located));

    plain.and_then(located)
}

/// Handle to the process logger.
///
/// Holds the file sink, if one was opened, so it can be flushed at
/// shutdown.
#[derive(Debug, Clone)]
pub struct Logger {
    level: LevelFilter,
    file: Option<Arc<File>>,
    file_path: Option<PathBuf>,
}

impl Logger {
    /// Builds the logger and its subscriber without installing it.
    ///
    /// A log file that cannot be opened is skipped and the logger writes to
    /// the console only.
    pub fn build(config: &LoggingConfig) -> (Self, impl Subscriber + Send + Sync) {
        let level = parse_level(&config.level);

        let file = config
            .file
            .as_deref()
            .and_then(|path| open_log_file(path).ok())
            .map(Arc::new);
        let file_path = file.as_ref().and(config.file.clone());

        let subscriber = tracing_subscriber::registry()
            .with(level)
            .with(sink(io::stdout))
            .with(file.clone().map(sink));

        let logger = Self {
            level,
            file,
            file_path,
        };
        (logger, subscriber)
    }

    /// Builds the logger and installs it as the global default.
    ///
    /// Fails if a global subscriber is already set; the existing one stays
    /// active.
    pub fn init(config: &LoggingConfig) -> Result<Self, TryInitError> {
        let (logger, subscriber) = Self::build(config);
        subscriber.try_init()?;
        Ok(logger)
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Path of the active file sink, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Flushes the file sink to disk.
    pub fn sync(&self) -> io::Result<()> {
        match &self.file {
            Some(file) => file.sync_all(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::DEBUG);
        assert_eq!(parse_level("info"), LevelFilter::INFO);
        assert_eq!(parse_level("warn"), LevelFilter::WARN);
        assert_eq!(parse_level("error"), LevelFilter::ERROR);
    }

    #[test]
    fn test_parse_level_is_case_sensitive() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::INFO);
        assert_eq!(parse_level("verbose"), LevelFilter::INFO);
        assert_eq!(parse_level(""), LevelFilter::INFO);
    }

    #[test]
    fn test_console_only_without_file() {
        let (logger, _subscriber) = Logger::build(&LoggingConfig::default());
        assert!(logger.file_path().is_none());
        assert_eq!(logger.level(), LevelFilter::INFO);
        assert!(logger.sync().is_ok());
    }

    #[test]
    fn test_unopenable_file_falls_back_to_console() {
        let config = LoggingConfig {
            file: Some(PathBuf::from("/nonexistent-dir/pulse/app.log")),
            ..LoggingConfig::default()
        };
        let (logger, _subscriber) = Logger::build(&config);
        assert!(logger.file_path().is_none());
    }

    #[test]
    fn test_second_init_reports_existing_subscriber() {
        // the first install may or may not win; a second one never does
        let _ = Logger::init(&LoggingConfig::default());
        assert!(Logger::init(&LoggingConfig::default()).is_err());
    }

    #[test]
    fn test_file_sink_receives_records_above_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("threshold.log");
        let config = LoggingConfig {
            level: "warn".to_string(),
            file: Some(path.clone()),
            ..LoggingConfig::default()
        };
        let (logger, subscriber) = Logger::build(&config);
        assert_eq!(logger.file_path(), Some(path.as_path()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("below threshold");
            tracing::warn!(component = "test", "above threshold");
        });
        logger.sync().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("below threshold"));
        let line = contents
            .lines()
            .find(|l| l.contains("above threshold"))
            .expect("warn record written");
        let record: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(record["level"], "WARN");
        assert_eq!(record["fields"]["component"], "test");
        assert!(record["timestamp"].is_string());
        assert!(record.get("filename").is_none());
    }

    #[test]
    fn test_error_records_carry_caller_location() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("located.log");
        let config = LoggingConfig {
            file: Some(path.clone()),
            ..LoggingConfig::default()
        };
        let (logger, subscriber) = Logger::build(&config);

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("something failed");
        });
        logger.sync().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let records: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["level"], "ERROR");
        assert!(records[0]["filename"].as_str().unwrap().ends_with("logging.rs"));
        assert!(records[0]["line_number"].is_number());
    }

    #[test]
    fn test_file_is_appended() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("append.log");
        fs::write(&path, "existing line\n").unwrap();
        let config = LoggingConfig {
            file: Some(path.clone()),
            ..LoggingConfig::default()
        };
        let (logger, subscriber) = Logger::build(&config);

        tracing::subscriber::with_default(subscriber, || tracing::info!("appended"));
        logger.sync().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("existing line\n"));
        assert!(contents.contains("appended"));
    }
}

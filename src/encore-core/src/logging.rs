use crate::{config::LoggingConfig, paths::AppDirs};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE_STEM: &str = "encore.log";

/// Keeps the non-blocking file writer alive; drop flushes pending records.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init_logging(config: &LoggingConfig, dirs: &AppDirs) -> Result<LoggingGuard, LoggingError> {
    let log_dir = dirs.log_dir().to_path_buf();
    fs::create_dir_all(&log_dir).map_err(|source| LoggingError::CreateDirectory {
        path: log_dir.clone(),
        source,
    })?;

    let filter = EnvFilter::try_new(config.level.as_filter_directive()).map_err(|source| {
        LoggingError::ParseLevel {
            level: config.level.as_filter_directive().to_string(),
            source,
        }
    })?;

    let file_stem = config.file_name.as_deref().unwrap_or(DEFAULT_LOG_FILE_STEM);
    cleanup_old_logs(&log_dir, file_stem, config.max_log_files.max(1))?;

    let appender = tracing_appender::rolling::daily(&log_dir, file_stem);
    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(file_writer);

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    let install = if config.stdout {
        registry
            .with(fmt::layer().with_target(false))
            .try_init()
            .map_err(|e| LoggingError::SubscriberInstall(Box::new(e)))
    } else {
        registry
            .try_init()
            .map_err(|e| LoggingError::SubscriberInstall(Box::new(e)))
    };
    install?;

    Ok(LoggingGuard {
        _file_guard: Some(file_guard),
    })
}

fn cleanup_old_logs(dir: &Path, file_stem: &str, max_files: usize) -> Result<(), LoggingError> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(file_stem) {
                return None;
            }
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((entry.path(), modified))
        })
        .collect();

    if entries.len() <= max_files {
        return Ok(());
    }

    entries.sort_by_key(|(_, modified)| *modified);
    let remove_count = entries.len() - max_files;
    for (path, _) in entries.into_iter().take(remove_count) {
        fs::remove_file(&path).map_err(|source| LoggingError::Cleanup { path, source })?;
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse log level {level}: {source}")]
    ParseLevel {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInstall(Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to list log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove old log file {path}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::cleanup_old_logs;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn cleanup_keeps_newest_files() {
        let dir = tempdir().unwrap();
        for i in 1..=4 {
            File::create(dir.path().join(format!("encore.log.2026-01-0{i}"))).unwrap();
        }
        File::create(dir.path().join("unrelated.txt")).unwrap();

        cleanup_old_logs(dir.path(), "encore.log", 2).unwrap();

        let remaining: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("encore.log"))
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(dir.path().join("unrelated.txt").exists());
    }
}

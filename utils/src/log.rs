use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{SecondsFormat, Utc};
use log::{LevelFilter, Log, Metadata, Record};

use crate::disk_storage::app_dir;

pub const LOG_FILE_NAME: &str = "statement.log";

/// Appends every record to a file, the terminal stays free for the statement.
pub struct FileLogger {
    file: Mutex<File>,
    level: LevelFilter,
}

impl FileLogger {
    pub fn open(path: &Path, level: LevelFilter) -> crate::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| crate::Error::CreateDirAllFailed(parent.to_path_buf(), e))?;
        }

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| crate::Error::FileWriteFailed(path.to_path_buf(), e))?;

        Ok(Self {
            file: Mutex::new(file),
            level,
        })
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "{} {:<5} [{}] {}",
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Installs the file logger as the global logger, returns the log file path.
pub fn init(level: LevelFilter) -> crate::Result<PathBuf> {
    let path = app_dir()?.join(LOG_FILE_NAME);
    let logger = FileLogger::open(&path, level)?;

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_writes_enabled_records_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join(LOG_FILE_NAME);
        let logger = FileLogger::open(&path, LevelFilter::Info).unwrap();

        logger.log(
            &Record::builder()
                .level(Level::Warn)
                .target("statement_common::combine")
                .args(format_args!("metadata changed"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .args(format_args!("dropped"))
                .build(),
        );
        logger.flush();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("WARN  [statement_common::combine] metadata changed"));
        assert!(!content.contains("dropped"));
    }
}

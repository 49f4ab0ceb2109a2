//! Config-driven file logger behind the `log` facade.
//!
//! The debug log is truncated at startup, given a UTF-8 BOM and a timestamp
//! header, then appended to one line per record. The threshold follows the
//! five-level scheme DEBUG < INFO < WARNING < ERROR < NONE and can be
//! promoted automatically when a WARNING-or-above record is written.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// ログレベル。NONE はすべて抑止する
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    None,
}

impl LogLevel {
    /// 設定ファイルの値から。未知の文字列は None (未対応) を返す
    pub fn parse(s: &str) -> Option<LogLevel> {
        match s {
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARNING" => Some(LogLevel::Warning),
            "ERROR" => Some(LogLevel::Error),
            "NONE" => Some(LogLevel::None),
            _ => None,
        }
    }

    fn of_record(level: Level) -> LogLevel {
        match level {
            Level::Error => LogLevel::Error,
            Level::Warn => LogLevel::Warning,
            Level::Info => LogLevel::Info,
            Level::Debug | Level::Trace => LogLevel::Debug,
        }
    }

    fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::None => LevelFilter::Off,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::None => "NONE",
        };
        f.write_str(s)
    }
}

struct FileLogger {
    path: PathBuf,
    auto_adjust: bool,
    adjusted_level: LogLevel,
    threshold: Mutex<LogLevel>,
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let Ok(threshold) = self.threshold.lock() else {
            return false;
        };
        LogLevel::of_record(metadata.level()) >= *threshold
    }

    fn log(&self, record: &Record) {
        let level = LogLevel::of_record(record.level());
        let Ok(mut threshold) = self.threshold.lock() else {
            return;
        };
        if level < *threshold {
            return;
        }
        let Ok(mut file) = OpenOptions::new().append(true).open(&self.path) else {
            return;
        };
        let _ = writeln!(file, "{}", record.args());

        // WARNING 以上が実際に書かれたらレベルを引き下げる
        if self.auto_adjust && level >= LogLevel::Warning && *threshold > self.adjusted_level {
            let previous = *threshold;
            *threshold = self.adjusted_level;
            let _ = writeln!(
                file,
                "Log level automatically adjusted from {} to {}",
                previous, *threshold
            );
        }
    }

    fn flush(&self) {}
}

/// ログファイルを作り直してロガーを登録する
pub fn init(
    path: &Path,
    level: LogLevel,
    auto_adjust: bool,
    adjusted_level: LogLevel,
) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("failed to create debug log {}", path.display()))?;
    file.write_all(b"\xef\xbb\xbf")?;
    writeln!(
        file,
        "[{}] [{}]",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        level
    )?;
    drop(file);

    let logger = FileLogger {
        path: path.to_path_buf(),
        auto_adjust,
        adjusted_level,
        threshold: Mutex::new(level),
    };

    // 自動調整で下がり得るレベルまで record を通す
    let max = if auto_adjust {
        level.min(adjusted_level)
    } else {
        level
    };
    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;
    log::set_max_level(max.to_level_filter());
    Ok(())
}

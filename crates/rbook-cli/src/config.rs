//! config.ini の読み込み
//!
//! 認識するキーは log_level / auto_adjust_level / adjusted_level / mode の4つ。
//! それ以外の行は無視する。ファイルが無ければすべて既定値で続行する。

use std::path::Path;

use anyhow::{Context, Result};

use crate::logger::LogLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub log_level: LogLevel,
    pub auto_adjust_level: bool,
    pub adjusted_level: LogLevel,
    pub mode: u8,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: LogLevel::Error,
            auto_adjust_level: false,
            adjusted_level: LogLevel::Info,
            mode: 4,
        }
    }
}

/// 設定ファイルを読む。ファイルが無ければ既定値を返す。
/// mode の値が数値として読めない場合だけはエラー
pub fn read_config(path: &Path) -> Result<Config> {
    let mut config = Config::default();
    let Ok(content) = std::fs::read_to_string(path) else {
        log::debug!(
            "Config file not found, using defaults: {}",
            path.display()
        );
        return Ok(config);
    };

    for line in content.lines() {
        if let Some(value) = line.strip_prefix("log_level") {
            if let Some(value) = value.trim_start().strip_prefix('=') {
                match LogLevel::parse(value.trim()) {
                    Some(level) => config.log_level = level,
                    None => log::debug!(
                        "Unrecognized log_level value ignored: {}",
                        value.trim()
                    ),
                }
            }
        } else if let Some(value) = line.strip_prefix("auto_adjust_level=") {
            config.auto_adjust_level = value.trim().eq_ignore_ascii_case("true");
        } else if let Some(value) = line.strip_prefix("adjusted_level=") {
            match LogLevel::parse(value.trim()) {
                Some(level) => config.adjusted_level = level,
                None => log::debug!(
                    "Unrecognized adjusted_level value ignored: {}",
                    value.trim()
                ),
            }
        } else if let Some(value) = line.strip_prefix("mode=") {
            config.mode = value
                .trim()
                .parse()
                .with_context(|| format!("invalid mode value in config: {}", value.trim()))?;
        }
    }

    Ok(config)
}

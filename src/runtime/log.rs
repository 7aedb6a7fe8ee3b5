use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::Context;

use crate::utils::expand_and_resolve_path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevel(pub log::LevelFilter);
impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" | "warning" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "off" => log::LevelFilter::Off,
            _ => return Err(format!("Invalid log level: {}", s)),
        };
        Ok(LogLevel(level))
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        level.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogMode {
    Path,
    Terminal,
    Discard,
}
impl std::str::FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s.to_lowercase().as_str() {
            "path" | "file" => LogMode::Path,
            "terminal" | "term" | "cli" => LogMode::Terminal,
            "discard" | "none" => LogMode::Discard,
            _ => return Err(format!("Invalid log mode: {}", s)),
        };
        Ok(mode)
    }
}

///////////////////////////////
/// Install env_logger as the global `log` backend. RUST_LOG, if set, still
/// refines the filter on top of the given level
pub fn setup_global_logger(
    log_level: LogLevel,
    log_output: LogMode,
    log_path: PathBuf,
) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log_level.into());
    builder.parse_default_env();

    match log_output {
        LogMode::Discard => {
            builder.filter_level(log::LevelFilter::Off);
        }
        LogMode::Terminal => {
            builder.target(env_logger::Target::Stderr);
        }
        LogMode::Path => {
            let path = expand_and_resolve_path(&log_path)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
            builder.write_style(env_logger::WriteStyle::Never);
        }
    }

    builder
        .try_init()
        .context("Global logger was already initialised")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_and_mode() {
        assert_eq!(
            "WARNING".parse::<LogLevel>().unwrap(),
            LogLevel(log::LevelFilter::Warn)
        );
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!("file".parse::<LogMode>().unwrap(), LogMode::Path);
        assert_eq!("none".parse::<LogMode>().unwrap(), LogMode::Discard);
        assert!("syslog".parse::<LogMode>().is_err());
    }
}

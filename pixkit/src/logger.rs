use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;
use thiserror::Error;

const CONSOLE_PATTERN: &str = "{d(%H:%M:%S)} {l} {t} - {m}{n}";

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("cannot load log configuration {path}: {message}")]
    ConfigFile { path: String, message: String },

    #[error("invalid log configuration: {0}")]
    Config(String),

    #[error("logger already initialized: {0}")]
    AlreadySet(String),
}

/// Install the global logger.
///
/// A `log_config` YAML file takes precedence; otherwise log records go to
/// stderr at info level, or debug level when `verbose` is set.
pub fn init_logger(log_config: Option<&Path>, verbose: bool) -> Result<(), LoggerError> {
    if let Some(path) = log_config {
        return log4rs::init_file(path, Default::default()).map_err(|e| {
            LoggerError::ConfigFile {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        });
    }

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = console_config(level)?;
    log4rs::init_config(config)
        .map(|_| ())
        .map_err(|e| LoggerError::AlreadySet(e.to_string()))
}

fn console_config(level: LevelFilter) -> Result<Config, LoggerError> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();
    Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| LoggerError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_config_levels() {
        let config = console_config(LevelFilter::Debug).unwrap();
        assert_eq!(config.root().level(), LevelFilter::Debug);
        assert_eq!(config.appenders().len(), 1);
        let config = console_config(LevelFilter::Info).unwrap();
        assert_eq!(config.root().level(), LevelFilter::Info);
    }

    #[test]
    fn test_missing_config_file() {
        let result = init_logger(Some(Path::new("no/such/log4rs.yaml")), false);
        assert!(matches!(result, Err(LoggerError::ConfigFile { .. })));
    }
}

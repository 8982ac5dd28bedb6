//! Logging configuration and initialization
//!
//! Every Leadbook binary installs its subscriber through [`init_logging`].
//! Output can go to the console, a daily-rotated file, or both, as text or JSON.
//!
//! Environment variables read by [`LogConfig::from_env`]:
//!
//! | Variable          | Values                          | Default        |
//! |-------------------|---------------------------------|----------------|
//! | `LOG_LEVEL`       | trace, debug, info, warn, error | info           |
//! | `LOG_OUTPUT`      | console, file, both             | console        |
//! | `LOG_FORMAT`      | text, json                      | text           |
//! | `LOG_DIR`         | directory path                  | `./logs`       |
//! | `LOG_FILE_PREFIX` | file name prefix                | binary default |
//! | `LOG_FILTER`      | extra `EnvFilter` directives    | binary default |
//!
//! ```no_run
//! use leadbook_common::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::builder().log_file_prefix("leadbook-server").build();
//! let _guard = init_logging(&config.merge_env().unwrap()).unwrap();
//! tracing::info!("ready");
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::{CommonError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

impl FromStr for LogOutput {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "console" | "stdout" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" | "all" => Ok(LogOutput::Both),
            other => Err(CommonError::LogConfig(format!("unknown LOG_OUTPUT '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(CommonError::LogConfig(format!("unknown LOG_FORMAT '{other}'"))),
        }
    }
}

fn parse_level(s: &str) -> Result<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(CommonError::LogConfig(format!("unknown LOG_LEVEL '{other}'"))),
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub output: LogOutput,
    pub format: LogFormat,
    pub log_dir: PathBuf,
    /// File name prefix, e.g. `leadbook-worker` gives `leadbook-worker.2025-01-18`.
    pub log_file_prefix: String,
    /// Comma-separated `EnvFilter` directives, e.g. `sqlx=warn,tower_http=debug`.
    pub filter_directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            output: LogOutput::Console,
            format: LogFormat::Text,
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: "leadbook".to_string(),
            filter_directives: None,
        }
    }
}

impl LogConfig {
    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }

    /// Defaults overlaid with `LOG_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Overlays `LOG_*` variables on this configuration. Unset variables keep
    /// the current value, so binaries can supply their own defaults first.
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.level = parse_level(&level)?;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.output = output.parse()?;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.format = format.parse()?;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Ok(prefix) = std::env::var("LOG_FILE_PREFIX") {
            self.log_file_prefix = prefix;
        }
        if let Ok(filter) = std::env::var("LOG_FILTER") {
            self.filter_directives = Some(filter);
        }
        Ok(self)
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::builder()
            .with_default_directive(self.level.into())
            .from_env_lossy();

        for directive in self.filter_directives.iter().flat_map(|d| d.split(',')) {
            let directive = directive.trim();
            if directive.is_empty() {
                continue;
            }
            filter = filter.add_directive(directive.parse().map_err(|e| {
                CommonError::LogConfig(format!("bad filter directive '{directive}': {e}"))
            })?);
        }

        Ok(filter)
    }
}

#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    pub fn level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.config.output = output;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    pub fn log_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.log_file_prefix = prefix.into();
        self
    }

    pub fn filter_directives(mut self, filter: impl Into<String>) -> Self {
        self.config.filter_directives = Some(filter.into());
        self
    }

    pub fn build(self) -> LogConfig {
        self.config
    }
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn console_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Text => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
    }
}

fn file_layer(config: &LogConfig) -> Result<(BoxedLayer, WorkerGuard)> {
    std::fs::create_dir_all(&config.log_dir)?;
    let appender = tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = match config.format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(false).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(writer)
            .boxed(),
    };

    Ok((layer, guard))
}

/// Installs the global subscriber.
///
/// When file output is enabled the returned guard flushes the background
/// writer on drop; hold it for the lifetime of the process.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if matches!(config.output, LogOutput::Console | LogOutput::Both) {
        layers.push(console_layer(config.format));
    }
    if matches!(config.output, LogOutput::File | LogOutput::Both) {
        let (layer, file_guard) = file_layer(config)?;
        layers.push(layer);
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(config.env_filter()?)
        .try_init()
        .map_err(|e| CommonError::LogInit(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in ["LOG_LEVEL", "LOG_OUTPUT", "LOG_FORMAT", "LOG_DIR", "LOG_FILE_PREFIX", "LOG_FILTER"]
        {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_outputs_and_formats() {
        assert_eq!("BOTH".parse::<LogOutput>().unwrap(), LogOutput::Both);
        assert_eq!("stdout".parse::<LogOutput>().unwrap(), LogOutput::Console);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("syslog".parse::<LogOutput>().is_err());
        assert!(parse_level("loud").is_err());
        assert_eq!(parse_level("Warning").unwrap(), Level::WARN);
    }

    #[test]
    #[serial]
    fn test_merge_env_keeps_builder_defaults() {
        clear_env();
        std::env::set_var("LOG_FORMAT", "json");

        let config = LogConfig::builder()
            .log_file_prefix("leadbook-worker")
            .filter_directives("sqlx=warn")
            .build()
            .merge_env()
            .unwrap();

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.log_file_prefix, "leadbook-worker");
        assert_eq!(config.filter_directives.as_deref(), Some("sqlx=warn"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_merge_env_rejects_bad_level() {
        clear_env();
        std::env::set_var("LOG_LEVEL", "chatty");
        assert!(LogConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_bad_filter_directive_is_reported() {
        let config = LogConfig::builder().filter_directives("sqlx=notalevel").build();
        assert!(matches!(config.env_filter(), Err(CommonError::LogConfig(_))));
    }

    #[test]
    fn test_file_layer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested/logs");
        let config = LogConfig::builder()
            .output(LogOutput::File)
            .log_dir(&log_dir)
            .build();

        let (_layer, _guard) = file_layer(&config).unwrap();
        assert!(log_dir.is_dir());
    }
}

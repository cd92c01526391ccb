//! Logging for Ductile
//!
//! Every crate in the workspace logs through the `tracing` macros
//! re-exported here, with structured fields (registration ids, contract
//! names, handler counts). Installing a subscriber is the application's
//! choice; [`LogConfig`] provides the default one, JSON on STDOUT.
//!
//! # Examples
//!
//! ```no_run
//! use ductile_core::logging::*;
//!
//! let _guard = LogConfig::default().init().expect("logging already installed");
//! info!("Container starting");
//! ```
//!
//! Configuration can also come from the environment:
//!
//! - `DUCTILE_LOG_LEVEL=trace|debug|info|warn|error`
//! - `DUCTILE_LOG_FORMAT=json|plain|pretty|compact`
//!
//! ```no_run
//! use ductile_core::logging::LogConfig;
//!
//! let _guard = LogConfig::from_env().with_env_filter("ductile_events=debug").init();
//! ```

use crate::{Error, Result};
use std::io;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    fmt, layer::Layered, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

// Re-export tracing macros for the rest of the workspace
pub use tracing::{debug, error, info, trace, warn};

const LEVEL_VAR: &str = "DUCTILE_LOG_LEVEL";
const FORMAT_VAR: &str = "DUCTILE_LOG_FORMAT";

type Filtered = Layered<EnvFilter, Registry>;

/// Minimum level written when no filter directive is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by [`EnvFilter`]
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.trim().to_ascii_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => return None,
        })
    }
}

/// How each event is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    Plain,
    /// Multi-line, for development
    Pretty,
    Compact,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "plain" => LogFormat::Plain,
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => return None,
        })
    }
}

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Appended to, created if missing
    File(String),
}

/// Subscriber settings for an application embedding the container.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Print the emitting module
    pub targets: bool,
    /// ANSI colors for the text formats
    pub colors: bool,
    /// Filter directive; takes precedence over `level`
    pub env_filter: Option<String>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `DUCTILE_LOG_LEVEL` and `DUCTILE_LOG_FORMAT`.
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Same as [`LogConfig::from_env`] over an explicit variable set
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .fold(Self::default(), |config, (key, value)| match key.as_str() {
                LEVEL_VAR => match LogLevel::parse(&value) {
                    Some(level) => config.level(level),
                    None => config,
                },
                FORMAT_VAR => match LogFormat::parse(&value) {
                    Some(format) => config.format(format),
                    None => config,
                },
                _ => config,
            })
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    pub fn with_colors(mut self, enable: bool) -> Self {
        self.colors = enable;
        self
    }

    /// Set a filter such as `ductile_core=info,ductile_events=trace`
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Install the global subscriber.
    ///
    /// The returned guard flushes buffered output when dropped and must be
    /// kept alive for as long as logs should be written. Fails if a global
    /// subscriber is already installed, the filter does not parse or the log
    /// file cannot be opened.
    pub fn init(self) -> Result<WorkerGuard> {
        let filter = self.filter()?;
        let (writer, guard) = self.writer()?;

        tracing_subscriber::registry()
            .with(filter)
            .with(self.layer(writer))
            .try_init()
            .map_err(|e| Error::Logging(e.to_string()))?;

        Ok(guard)
    }

    fn filter(&self) -> Result<EnvFilter> {
        match &self.env_filter {
            Some(directive) => EnvFilter::try_new(directive)
                .map_err(|e| Error::Logging(format!("invalid filter `{directive}`: {e}"))),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.directive()))),
        }
    }

    fn writer(&self) -> Result<(NonBlocking, WorkerGuard)> {
        Ok(match &self.output {
            LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
            LogOutput::File(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                tracing_appender::non_blocking(file)
            }
        })
    }

    fn layer(&self, writer: NonBlocking) -> Box<dyn Layer<Filtered> + Send + Sync> {
        let base = fmt::layer()
            .with_writer(writer)
            .with_target(self.targets)
            .with_ansi(self.colors && self.format != LogFormat::Json);

        match self.format {
            LogFormat::Json => base.json().boxed(),
            LogFormat::Plain => base.boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
            LogFormat::Compact => base.compact().boxed(),
        }
    }
}

impl Default for LogConfig {
    /// JSON to STDOUT at INFO
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            targets: true,
            colors: false,
            env_filter: None,
        }
    }
}

//! Subscriber setup for the Graph toolkit.
//!
//! Library crates only emit `tracing` events and spans. An application opts
//! into output by calling [`init_logging`] once at startup:
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format(LogFormat::Compact)
//!         .with_level(LogLevel::Debug),
//! )?;
//! tracing::debug!(target: "provider_msgraph", "ready");
//! ```
//!
//! Values that may carry credentials or personal data go through
//! [`redact_if_sensitive`] and [`strip_path`] before they reach a field.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::{Error, Result};

/// Crates whose events follow the configured level.
const WORKSPACE_TARGETS: &[&str] = &[
    "msgraph_toolkit",
    "core_runtime",
    "core_auth",
    "provider_msgraph",
    "bridge_desktop",
];

/// Transport internals, held at `warn` unless a custom filter says otherwise.
const TRANSPORT_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "reqwest", "rustls"];

const REDACTED: &str = "[REDACTED]";

/// Field names whose values are never logged.
const SECRET_FIELDS: &[&str] = &[
    "token",
    "secret",
    "password",
    "authorization",
    "bearer",
    "upload_url",
    "content_bytes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let level = match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            other => return Err(Error::Config(format!("Unknown log level: {other}"))),
        };
        Ok(level)
    }
}

/// Output layout of the installed subscriber.
///
/// Debug builds default to `Pretty`, release builds to `Json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Full `EnvFilter` directive; replaces the per-crate defaults when set.
    pub filter: Option<String>,
    /// Record span open/close (text formats) or span context (JSON).
    pub enable_spans: bool,
    pub display_target: bool,
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(self, format: LogFormat) -> Self {
        Self { format, ..self }
    }

    pub fn with_level(self, level: LogLevel) -> Self {
        Self { level, ..self }
    }

    pub fn with_filter(self, filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            ..self
        }
    }

    pub fn with_spans(self, enable_spans: bool) -> Self {
        Self {
            enable_spans,
            ..self
        }
    }

    pub fn with_target(self, display_target: bool) -> Self {
        Self {
            display_target,
            ..self
        }
    }

    pub fn with_thread_info(self, display_thread_info: bool) -> Self {
        Self {
            display_thread_info,
            ..self
        }
    }

    /// Filter directives this configuration resolves to.
    fn directives(&self) -> String {
        if let Some(custom) = &self.filter {
            return custom.clone();
        }
        let level = self.level.as_str();
        WORKSPACE_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .chain(TRANSPORT_TARGETS.iter().map(|target| format!("{target}=warn")))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_new(self.directives())
            .map_err(|e| Error::Config(format!("Invalid log filter: {e}")))
    }

    fn span_events(&self) -> FmtSpan {
        if self.enable_spans {
            FmtSpan::ACTIVE
        } else {
            FmtSpan::NONE
        }
    }

    fn output_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = tracing_subscriber::fmt::layer()
            .with_target(self.display_target)
            .with_thread_ids(self.display_thread_info)
            .with_thread_names(self.display_thread_info)
            .with_writer(std::io::stdout);

        match self.format {
            LogFormat::Pretty => base.pretty().with_span_events(self.span_events()).boxed(),
            LogFormat::Compact => base.compact().with_span_events(self.span_events()).boxed(),
            LogFormat::Json => base
                .json()
                .flatten_event(true)
                .with_current_span(self.enable_spans)
                .with_span_list(self.enable_spans)
                .boxed(),
        }
    }
}

/// Install the global subscriber.
///
/// Fails with `Error::Config` when the filter does not parse or a global
/// subscriber is already set.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = config.env_filter()?;

    tracing_subscriber::registry()
        .with(config.output_layer())
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {e}")))
}

/// Loggable form of `value`.
///
/// Secret-bearing field names are masked entirely. Anything shaped like an
/// email address keeps its first character only.
///
/// ```ignore
/// info!(to = %redact_if_sensitive("to", "alice@contoso.com"), "sending");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    let field = field_name.to_ascii_lowercase();
    if SECRET_FIELDS.iter().any(|secret| field.contains(secret)) {
        return REDACTED.to_string();
    }

    match value.split_once('@') {
        Some((local, domain)) if domain.contains('.') => {
            let initial: String = local.chars().take(1).collect();
            format!("{initial}***@{REDACTED}")
        }
        _ => value.to_string(),
    }
}

/// File name portion of a local path, for either separator style.
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_cover_workspace_and_quiet_transport() {
        let directives = LoggingConfig::default()
            .with_level(LogLevel::Debug)
            .directives();

        assert!(directives.contains("provider_msgraph=debug"));
        assert!(directives.contains("core_auth=debug"));
        assert!(directives.contains("reqwest=warn"));
        assert!(!directives.contains("reqwest=debug"));
    }

    #[test]
    fn custom_filter_replaces_defaults() {
        let config = LoggingConfig::default().with_filter("provider_msgraph=trace");

        assert_eq!(config.directives(), "provider_msgraph=trace");
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn unparsable_filter_is_config_error() {
        let config = LoggingConfig::default().with_filter("core_auth=verbose");
        assert!(matches!(config.env_filter(), Err(Error::Config(_))));
    }

    #[test]
    fn level_names_parse_loosely() {
        assert_eq!(" Info ".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("chatty".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn spans_toggle_span_events() {
        assert_eq!(LoggingConfig::default().span_events(), FmtSpan::ACTIVE);
        assert_eq!(
            LoggingConfig::default().with_spans(false).span_events(),
            FmtSpan::NONE
        );
    }

    #[test]
    fn format_follows_build_profile() {
        let expected = if cfg!(debug_assertions) {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        };
        assert_eq!(LogFormat::default(), expected);
    }

    #[test]
    fn emails_keep_only_first_character() {
        assert_eq!(
            redact_if_sensitive("recipient", "alice@contoso.com"),
            "a***@[REDACTED]"
        );
        // No dotted domain, not treated as an address
        assert_eq!(redact_if_sensitive("path", "a@b"), "a@b");
        assert_eq!(
            redact_if_sensitive("upload_url", "https://outlook.office.com/x"),
            REDACTED
        );
    }

    #[test]
    fn trailing_separator_yields_empty_name() {
        assert_eq!(strip_path("/var/spool/"), "");
        assert_eq!(strip_path("report.xlsx"), "report.xlsx");
    }
}
